//! Invoice Intake Vendor Clients
//!
//! Implementations of the [`ChatModel`] and [`OcrService`] traits from
//! `intake-domain`.
//!
//! # Providers
//!
//! - [`ClaudeProvider`]: Anthropic Messages API, multimodal
//! - [`MistralProvider`]: Mistral chat completions and OCR
//! - [`MockChatModel`] / [`MockOcrService`]: deterministic doubles for testing
//!
//! # Examples
//!
//! ```
//! use intake_llm::MockChatModel;
//! use intake_domain::{ChatModel, ChatRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let model = MockChatModel::new(r#"{"invoice_number": "7"}"#);
//! let reply = model.chat(ChatRequest::text("prompt")).await.unwrap();
//! assert_eq!(reply, r#"{"invoice_number": "7"}"#);
//! # }
//! ```

#![warn(missing_docs)]

mod http;

pub mod claude;
pub mod mistral;

use async_trait::async_trait;
use intake_domain::{ChatModel, ChatRequest, OcrDocument, OcrService, VendorError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub use claude::ClaudeProvider;
pub use http::DEFAULT_TIMEOUT_SECS;
pub use mistral::MistralProvider;

/// Default completion token limit
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// System message sent with every Claude request
pub const SYSTEM_PROMPT: &str = "You are an expert document and invoice analyzer. \
Extract the requested fields exactly as they appear in the document and answer \
with a single valid JSON object and nothing else.";

/// Mock chat model for deterministic testing
///
/// Queued replies are served first, in order; after the queue drains every
/// call returns the default reply. Clones share the queue and counters.
///
/// # Examples
///
/// ```
/// use intake_llm::MockChatModel;
/// use intake_domain::VendorError;
///
/// let model = MockChatModel::new("{}");
/// model.push_error(VendorError::Status { status: 429, body: "slow down".into() });
/// assert_eq!(model.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockChatModel {
    default_reply: String,
    queued: Arc<Mutex<VecDeque<Result<String, VendorError>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChatModel {
    /// Create a mock that answers every request with `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a one-off reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut queue) = self.queued.lock() {
            queue.push_back(Ok(reply.into()));
        }
    }

    /// Queue a one-off failure
    pub fn push_error(&self, error: VendorError) {
        if let Ok(mut queue) = self.queued.lock() {
            queue.push_back(Err(error));
        }
    }

    /// Number of `chat` calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<String, VendorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// Mock OCR service returning a fixed JSON response
#[derive(Debug, Clone)]
pub struct MockOcrService {
    response: Result<Value, VendorError>,
    documents: Arc<Mutex<Vec<OcrDocument>>>,
}

impl MockOcrService {
    /// Mock that answers with `response`
    pub fn new(response: Value) -> Self {
        Self {
            response: Ok(response),
            documents: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that always fails with `error`
    pub fn failing(error: VendorError) -> Self {
        Self {
            response: Err(error),
            documents: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `ocr` calls so far
    pub fn call_count(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// The documents submitted, in order
    pub fn documents(&self) -> Vec<OcrDocument> {
        self.documents.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OcrService for MockOcrService {
    async fn ocr(&self, document: &OcrDocument) -> Result<Value, VendorError> {
        if let Ok(mut documents) = self.documents.lock() {
            documents.push(document.clone());
        }
        self.response.clone()
    }
}
