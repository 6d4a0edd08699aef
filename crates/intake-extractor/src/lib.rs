//! Invoice Intake Extractor
//!
//! Converts invoice files (photos, scans, PDFs, spreadsheets, text) into a
//! structured [`ParsedDocument`](intake_domain::ParsedDocument) using an LLM.
//!
//! # Architecture
//!
//! ```text
//! File → ContentExtractor ─┬─────────────────────→ PromptBuilder → ChatModel → parser → ProcessingResult
//!                          └→ OcrService → ocr::extract_text ─┘
//! ```
//!
//! # Key Features
//!
//! - **Two backends**: direct multimodal, or OCR-then-chat, selected once
//! - **Image optimization**: bounded resize and JPEG re-encode, never upscaling
//! - **Tolerant parsing**: finds the JSON object inside free-form replies,
//!   validates its shape, and coerces every number to a finite `f64`
//! - **Bounded vendor calls**: every LLM/OCR call runs under a timeout
//! - **Reply rendering**: pretty JSON and `.xlsx` payloads
//!
//! # Example Usage
//!
//! ```no_run
//! use intake_extractor::{Backend, Extractor, ExtractorConfig};
//! use intake_llm::ClaudeProvider;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let chat = ClaudeProvider::new("sk-ant-...", "claude-3-7-sonnet-20250219")?;
//! let extractor = Extractor::new(Backend::multimodal(chat), ExtractorConfig::default())?;
//!
//! let result = extractor.process_document(Path::new("uploads/invoice.jpg"), None).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod content;
mod error;
mod extractor;
pub mod ocr;
pub mod parser;
mod prompt;
pub mod report;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, MAX_VENDOR_TIMEOUT_SECS};
pub use content::{optimize_image, ContentExtractor, ExtractedContent, UnknownFormat};
pub use error::ExtractorError;
pub use extractor::{Backend, Extractor};
pub use parser::{parse, ParsedOutput};
pub use prompt::PromptBuilder;
