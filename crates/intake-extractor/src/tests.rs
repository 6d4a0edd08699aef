//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{Backend, Extractor, ExtractorConfig};
    use async_trait::async_trait;
    use intake_domain::{ChatModel, ChatRequest, FileKind, ProcessingResult, VendorError};
    use intake_llm::{MockChatModel, MockOcrService};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Reply in the shape the prompt's worked example asks for
    const BRICK_REPLY: &str = r#"Here is the extracted data:
{
    "invoice_number": "Л-25/46",
    "invoice_date": "01.01.2025",
    "edrpou": "35601501",
    "ipn": "356015004822",
    "supplier": "ТОВ 'Будматеріали'",
    "isPriceWithPdv": true,
    "items": [
        {
            "name": "Кирпич",
            "article": null,
            "quantity": 10,
            "unit": "100шт",
            "price_no_pdv": 100,
            "price_with_pdv": 110,
            "total_no_pdv": 1000,
            "total_with_pdv": 1100
        }
    ],
    "total_no_pdv": 1000,
    "total_pdv": 100,
    "total_with_pdv": 1100
}"#;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 200, 200]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Chat model that never answers in time
    struct StalledModel;

    #[async_trait]
    impl ChatModel for StalledModel {
        async fn chat(&self, _request: ChatRequest) -> Result<String, VendorError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }

        fn model_id(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_plain_text_invoice_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "invoice.txt",
            "Рахунок-фактура № Л-25/46\nкод за ЄДРПОУ 35601501, ІПН 356015004822\nКирпич, 100шт, 10, 110\n".as_bytes(),
        );

        let chat = MockChatModel::new(BRICK_REPLY);
        let ocr = MockOcrService::new(json!({}));
        let extractor = Extractor::new(
            Backend::ocr_then_chat(ocr.clone(), chat.clone()),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, None).await;
        let doc = result.data().expect("success");

        assert_eq!(doc.edrpou, "35601501");
        assert_eq!(doc.ipn, "356015004822");
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].quantity, 10.0);
        assert_eq!(doc.items[0].unit, "100шт");

        // Text files never touch OCR; the document text ends the prompt
        assert_eq!(ocr.call_count(), 0);
        let prompt = chat.last_request().unwrap().prompt;
        assert!(prompt.ends_with("Кирпич, 100шт, 10, 110\n\n"));
    }

    #[tokio::test]
    async fn test_rate_limited_vendor_becomes_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "invoice.txt", b"anything");

        let chat = MockChatModel::new(BRICK_REPLY);
        chat.push_error(VendorError::Status {
            status: 429,
            body: "rate limit exceeded".into(),
        });
        let extractor = Extractor::new(
            Backend::ocr_then_chat(MockOcrService::new(json!({})), chat),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, None).await;
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_reported_as_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "invoice.csv", "Name,Qty\nКирпич,10\n".as_bytes());

        let extractor = Extractor::new(
            Backend::multimodal(MockChatModel::new("Sorry, I cannot read this invoice.")),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, None).await;
        assert!(matches!(result, ProcessingResult::Failure(ref m) if m.contains("no JSON object")));
    }

    #[tokio::test]
    async fn test_multimodal_attaches_optimized_image() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "scan.png", &png_bytes(2000, 1000));

        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = Extractor::new(Backend::multimodal(chat.clone()), ExtractorConfig::default()).unwrap();

        let result = extractor.process_document(&path, None).await;
        assert!(result.is_success());

        let request = chat.last_request().unwrap();
        let image = request.image.expect("image attached");
        assert_eq!(image.media_type, "image/jpeg");
        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1500, 750));
        assert!(!request.prompt.contains("Document content:"));
    }

    #[tokio::test]
    async fn test_multimodal_spreadsheet_prompt_has_hint() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "items.csv", "Name,Qty\nПесок,5\n".as_bytes());

        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = Extractor::new(Backend::multimodal(chat.clone()), ExtractorConfig::default()).unwrap();
        extractor.process_document(&path, None).await;

        let request = chat.last_request().unwrap();
        assert!(request.image.is_none());
        assert!(request.prompt.contains("spreadsheet in text form"));
        assert!(request.prompt.contains("Песок\t5"));
    }

    #[tokio::test]
    async fn test_multimodal_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.docx", b"binary");

        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = Extractor::new(Backend::multimodal(chat.clone()), ExtractorConfig::default()).unwrap();

        let result = extractor.process_document(&path, None).await;
        assert_eq!(result.error(), Some("Unsupported file format: .docx"));
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ocr_backend_uses_remote_reference() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "invoice.pdf", b"%PDF-1.4 not parsed locally");

        let ocr = MockOcrService::new(json!({
            "pages": [{"index": 1, "markdown": "Рахунок № Л-25/46", "tables": [{"rows": [["Кирпич", "10"]]}]}]
        }));
        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = Extractor::new(
            Backend::ocr_then_chat(ocr.clone(), chat.clone()),
            ExtractorConfig::default(),
        )
        .unwrap();

        let url = "https://files.example/documents/file_1.pdf";
        let result = extractor.process_document(&path, Some(url)).await;
        assert!(result.is_success());

        let documents = ocr.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].url, url);
        assert_eq!(documents[0].kind, FileKind::Pdf);

        let prompt = chat.last_request().unwrap().prompt;
        assert!(prompt.contains("=== Page 1 ===\nРахунок № Л-25/46\n\n--- Tables on page 1 ---"));
    }

    #[tokio::test]
    async fn test_ocr_backend_requires_remote_reference() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "photo.jpg", &png_bytes(10, 10));

        let ocr = MockOcrService::new(json!({"text": "x"}));
        let extractor = Extractor::new(
            Backend::ocr_then_chat(ocr.clone(), MockChatModel::new(BRICK_REPLY)),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, None).await;
        assert!(result.error().unwrap().contains("remote file reference"));
        assert_eq!(ocr.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ocr_without_text_is_distinct_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "photo.jpg", &png_bytes(10, 10));

        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = Extractor::new(
            Backend::ocr_then_chat(MockOcrService::new(json!({"pages": []})), chat.clone()),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, Some("https://files.example/photo.jpg")).await;
        assert!(result.error().unwrap().contains("no text"));
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ocr_vendor_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "photo.jpg", &png_bytes(10, 10));

        let extractor = Extractor::new(
            Backend::ocr_then_chat(
                MockOcrService::failing(VendorError::Status {
                    status: 500,
                    body: "internal".into(),
                }),
                MockChatModel::new(BRICK_REPLY),
            ),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, Some("https://files.example/photo.jpg")).await;
        assert_eq!(result.error(), Some("vendor returned HTTP 500: internal"));
    }

    #[tokio::test]
    async fn test_vendor_call_is_bounded_by_timeout() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "invoice.csv", b"a,b\n");

        let config = ExtractorConfig {
            vendor_timeout_secs: 1,
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(Backend::multimodal(StalledModel), config).unwrap();

        let result = extractor.process_document(&path, None).await;
        assert_eq!(result.error(), Some("Vendor call timed out after 1s"));
    }

    #[tokio::test]
    async fn test_missing_file_is_failure_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.pdf");

        let extractor = Extractor::new(
            Backend::multimodal(MockChatModel::new(BRICK_REPLY)),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.process_document(&path, None).await;
        assert!(result.error().unwrap().starts_with("Extraction error"));
    }

    #[tokio::test]
    async fn test_concurrent_documents_are_independent() {
        let dir = TempDir::new().unwrap();
        let chat = MockChatModel::new(BRICK_REPLY);
        let extractor = std::sync::Arc::new(
            Extractor::new(
                Backend::ocr_then_chat(MockOcrService::new(json!({})), chat.clone()),
                ExtractorConfig::default(),
            )
            .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let path = write_file(&dir, &format!("invoice_{}.txt", i), format!("Рахунок {}", i).as_bytes());
            let extractor = std::sync::Arc::clone(&extractor);
            handles.push(tokio::spawn(async move {
                extractor.process_document(&path, None).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
        assert_eq!(chat.call_count(), 8);
    }
}
