//! Core Extractor implementation
//!
//! Sequences content extraction, the optional OCR pass, prompt construction,
//! the chat call and response parsing for one inbound file.

use crate::config::ExtractorConfig;
use crate::content::{ContentExtractor, ExtractedContent, UnknownFormat};
use crate::error::ExtractorError;
use crate::ocr;
use crate::parser;
use crate::prompt::PromptBuilder;
use intake_domain::{ChatModel, ChatRequest, FileKind, OcrDocument, OcrService, ParsedDocument, ProcessingResult};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How a file reaches the model, chosen once at configuration time
#[derive(Clone)]
pub enum Backend {
    /// Images go to a multimodal model as attachments; documents as text
    Multimodal {
        /// Chat model that accepts image attachments
        chat: Arc<dyn ChatModel>,
    },
    /// Images and PDFs go through OCR by URL first, then a text-only chat
    OcrThenChat {
        /// OCR service
        ocr: Arc<dyn OcrService>,
        /// Chat model for the OCR text
        chat: Arc<dyn ChatModel>,
    },
}

impl Backend {
    /// Direct multimodal backend
    pub fn multimodal(chat: impl ChatModel + 'static) -> Self {
        Backend::Multimodal { chat: Arc::new(chat) }
    }

    /// OCR-then-chat backend
    pub fn ocr_then_chat(ocr: impl OcrService + 'static, chat: impl ChatModel + 'static) -> Self {
        Backend::OcrThenChat {
            ocr: Arc::new(ocr),
            chat: Arc::new(chat),
        }
    }

    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Multimodal { .. } => "multimodal",
            Backend::OcrThenChat { .. } => "ocr-then-chat",
        }
    }

    fn chat(&self) -> &Arc<dyn ChatModel> {
        match self {
            Backend::Multimodal { chat } | Backend::OcrThenChat { chat, .. } => chat,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.name())
            .field("model", &self.chat().model_id())
            .finish()
    }
}

/// The Extractor turns inbound files into parsed invoices
#[derive(Debug, Clone)]
pub struct Extractor {
    backend: Backend,
    config: ExtractorConfig,
}

impl Extractor {
    /// Create a new Extractor
    pub fn new(backend: Backend, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self { backend, config })
    }

    /// The configured backend
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Process one staged file
    ///
    /// `remote_ref` is a publicly reachable URL for the same file, needed by
    /// the OCR backend for images and PDFs. Every failure is converted into
    /// [`ProcessingResult::Failure`]; this method never returns an error.
    pub async fn process_document(&self, path: &Path, remote_ref: Option<&str>) -> ProcessingResult {
        let started = Instant::now();
        match self.run(path, remote_ref).await {
            Ok(document) => {
                info!(
                    file = %path.display(),
                    items = document.items.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Document processed"
                );
                ProcessingResult::Success(document)
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Document processing failed");
                ProcessingResult::failure(e.to_string())
            }
        }
    }

    async fn run(&self, path: &Path, remote_ref: Option<&str>) -> Result<ParsedDocument, ExtractorError> {
        let kind = FileKind::from_path(path);
        info!(
            file = %path.display(),
            kind = %kind,
            backend = self.backend.name(),
            "Processing document"
        );

        let request = match &self.backend {
            Backend::Multimodal { .. } => {
                match self.extract_content(path, kind, UnknownFormat::Reject).await? {
                    ExtractedContent::Image { media_type, data } => {
                        debug!(bytes = data.len(), media_type = %media_type, "Attaching image");
                        ChatRequest::with_image(PromptBuilder::for_image(), media_type, data)
                    }
                    ExtractedContent::Text(text) => text_request(text, kind),
                }
            }
            Backend::OcrThenChat { ocr, .. } => match kind {
                FileKind::Image | FileKind::Pdf => {
                    let url = remote_ref.ok_or(ExtractorError::MissingRemoteReference(kind))?;
                    let document = OcrDocument::new(url, kind);
                    let response: Value = self.with_timeout(ocr.ocr(&document)).await?;
                    let text = ocr::extract_text(&response)?;
                    text_request(text, kind)
                }
                _ => match self.extract_content(path, kind, UnknownFormat::PlainText).await? {
                    ExtractedContent::Text(text) => text_request(text, kind),
                    ExtractedContent::Image { .. } => {
                        return Err(ExtractorError::UnsupportedFormat(kind.to_string()))
                    }
                },
            },
        };

        let chat = self.backend.chat();
        debug!(model = chat.model_id(), prompt_chars = request.prompt.len(), "Calling chat model");
        let reply = self.with_timeout(chat.chat(request)).await?;
        debug!(reply_chars = reply.len(), "Received model reply");

        parser::parse(&reply).into_result()
    }

    /// Run blocking file extraction off the async runtime
    async fn extract_content(
        &self,
        path: &Path,
        kind: FileKind,
        unknown: UnknownFormat,
    ) -> Result<ExtractedContent, ExtractorError> {
        let extractor = ContentExtractor::new(self.config.clone()).with_unknown_format(unknown);
        let path: PathBuf = path.to_path_buf();

        tokio::task::spawn_blocking(move || extractor.extract(&path, kind))
            .await
            .map_err(|e| ExtractorError::Extraction(format!("extraction task failed: {}", e)))?
    }

    /// Bound a vendor call by the configured ceiling
    async fn with_timeout<T, F>(&self, call: F) -> Result<T, ExtractorError>
    where
        F: Future<Output = Result<T, intake_domain::VendorError>>,
    {
        timeout(self.config.vendor_timeout(), call)
            .await
            .map_err(|_| ExtractorError::Timeout(self.config.vendor_timeout_secs))?
            .map_err(ExtractorError::from)
    }
}

fn text_request(text: String, kind: FileKind) -> ChatRequest {
    debug!(text_chars = text.len(), "Building text prompt");
    ChatRequest::text(PromptBuilder::new(text).with_source(kind).build())
}
