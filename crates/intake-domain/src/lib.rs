//! Invoice Intake Domain Layer
//!
//! Value types and trait seams shared by every other crate in the workspace.
//! Nothing here performs I/O; vendor clients and the extraction pipeline live
//! in their own crates and depend on these definitions.
//!
//! ## Key Concepts
//!
//! - **ParsedDocument**: the whole-invoice record produced from model output
//! - **DocumentItem**: one line item on an invoice
//! - **ProcessingResult**: success with a document, or failure with a message
//! - **FileKind**: how an inbound file is treated, decided by its extension
//! - **ChatModel / OcrService**: the two vendor capabilities the pipeline calls
//!
//! ## Invariants
//!
//! Every numeric field of a [`ParsedDocument`] is a finite `f64`. The parser in
//! `intake-extractor` is the single place that enforces this.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod file_kind;
pub mod request;
pub mod result;
pub mod traits;

// Re-exports for convenience
pub use document::{DocumentItem, ParsedDocument};
pub use error::VendorError;
pub use file_kind::FileKind;
pub use request::RequestId;
pub use result::ProcessingResult;
pub use traits::{ChatModel, ChatRequest, ImageAttachment, OcrDocument, OcrService};
