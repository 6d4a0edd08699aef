//! Outcome of processing one inbound file

use crate::document::ParsedDocument;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Discriminated pipeline outcome
///
/// There is no partial success: a document whose model output could not be
/// parsed is reported as a failure even though a default document exists.
///
/// Serializes as `{"success": true, "data": {...}}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    /// Extraction succeeded
    Success(ParsedDocument),
    /// Extraction failed with a short human-readable message
    Failure(String),
}

impl ProcessingResult {
    /// Build a failure from anything displayable
    pub fn failure(message: impl Into<String>) -> Self {
        ProcessingResult::Failure(message.into())
    }

    /// True for [`ProcessingResult::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }

    /// The parsed document, if any
    pub fn data(&self) -> Option<&ParsedDocument> {
        match self {
            ProcessingResult::Success(doc) => Some(doc),
            ProcessingResult::Failure(_) => None,
        }
    }

    /// The failure message, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            ProcessingResult::Success(_) => None,
            ProcessingResult::Failure(message) => Some(message),
        }
    }
}

impl Serialize for ProcessingResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProcessingResult", 2)?;
        match self {
            ProcessingResult::Success(doc) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", doc)?;
            }
            ProcessingResult::Failure(message) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", message)?;
            }
        }
        state.end()
    }
}
