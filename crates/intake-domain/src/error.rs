//! Errors reported by vendor capabilities

use thiserror::Error;

/// Failure of an outbound LLM or OCR call
///
/// Vendor failures are never retried per request; the pipeline surfaces them
/// as failure results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VendorError {
    /// Vendor answered with a non-success HTTP status
    #[error("vendor returned HTTP {status}: {body}")]
    Status {
        /// Numeric HTTP status code
        status: u16,
        /// Response body text, possibly empty
        body: String,
    },

    /// Connection, TLS, or body-read failure
    #[error("vendor request failed: {0}")]
    Transport(String),

    /// The call did not finish within the configured ceiling
    #[error("vendor call timed out after {0}s")]
    Timeout(u64),

    /// Vendor answered 2xx but the body had an unexpected shape
    #[error("invalid vendor response: {0}")]
    InvalidResponse(String),
}

impl VendorError {
    /// HTTP status code, when the vendor answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            VendorError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_contains_code() {
        let err = VendorError::Status {
            status: 429,
            body: "rate limited".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_non_status_errors_have_no_code() {
        assert_eq!(VendorError::Timeout(60).status(), None);
        assert_eq!(VendorError::Transport("refused".into()).status(), None);
    }
}
