//! Error types for the Extractor

use intake_domain::{FileKind, VendorError};
use thiserror::Error;

/// Errors that can occur while turning a file into a ParsedDocument
///
/// The orchestrator converts every variant into a failure result; nothing here
/// escapes to the transport layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Source file unreadable or unparseable for its claimed type
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Extension not handled by the selected backend
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// LLM or OCR call failed
    #[error("{0}")]
    Vendor(#[from] VendorError),

    /// OCR answered but none of the known fields carried text
    #[error("OCR response contained no text; check the file format")]
    NoTextFound,

    /// Model reply had no JSON object, or it did not parse
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// JSON parsed but a field had a clearly invalid shape
    #[error("Invalid response shape: {0}")]
    InvalidShape(String),

    /// Vendor call exceeded the configured ceiling
    #[error("Vendor call timed out after {0}s")]
    Timeout(u64),

    /// OCR backend needs a public URL for images and PDFs
    #[error("A remote file reference is required to OCR {0} files")]
    MissingRemoteReference(FileKind),

    /// A parsed document could not be rendered as a reply payload
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::MalformedOutput(e.to_string())
    }
}
