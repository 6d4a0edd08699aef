//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and the
//! vendor APIs it calls. Implementations live in `intake-llm`.

use crate::error::VendorError;
use crate::file_kind::FileKind;
use async_trait::async_trait;
use serde_json::Value;

/// An image sent alongside a prompt to a multimodal model
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    /// MIME type of `data` (e.g. "image/jpeg")
    pub media_type: String,

    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// One chat call: an instruction prompt, optionally with an image
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Full prompt text
    pub prompt: String,

    /// Image for multimodal models
    pub image: Option<ImageAttachment>,
}

impl ChatRequest {
    /// Text-only request
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    /// Prompt plus an image attachment
    pub fn with_image(prompt: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(ImageAttachment {
                media_type: media_type.into(),
                data,
            }),
        }
    }
}

/// A document handed to an OCR service by URL
#[derive(Debug, Clone, PartialEq)]
pub struct OcrDocument {
    /// Publicly reachable URL of the file
    pub url: String,

    /// Image or PDF; decides the vendor payload shape
    pub kind: FileKind,
}

impl OcrDocument {
    /// Create a new OCR document reference
    pub fn new(url: impl Into<String>, kind: FileKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Last path segment of the URL, used as a document name
    pub fn file_name(&self) -> &str {
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("document")
    }
}

/// Trait for chat-completion models
///
/// Model identifier and token limit are fixed when the implementation is
/// constructed. Returns the model's free-form text answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one request and return the raw text reply
    async fn chat(&self, request: ChatRequest) -> Result<String, VendorError>;

    /// Model identifier, for logs
    fn model_id(&self) -> &str;
}

/// Trait for OCR services
///
/// The response is returned as an open JSON value; its shape is vendor
/// defined and normalized by the extractor.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Run OCR over a remote document
    async fn ocr(&self, document: &OcrDocument) -> Result<Value, VendorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_constructors() {
        let plain = ChatRequest::text("hello");
        assert!(plain.image.is_none());

        let multimodal = ChatRequest::with_image("look", "image/jpeg", vec![1, 2, 3]);
        let image = multimodal.image.unwrap();
        assert_eq!(image.media_type, "image/jpeg");
        assert_eq!(image.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_ocr_document_file_name() {
        let doc = OcrDocument::new("https://files.example/bot1/documents/file_7.pdf", FileKind::Pdf);
        assert_eq!(doc.file_name(), "file_7.pdf");

        let doc = OcrDocument::new("https://files.example/", FileKind::Image);
        assert_eq!(doc.file_name(), "document");
    }
}
