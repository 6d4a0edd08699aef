//! Mistral Provider Implementation
//!
//! Chat completions and document OCR against the Mistral API. OCR takes a
//! publicly reachable file URL, so the caller must supply one for images and
//! PDFs.

use crate::http::{build_client, ensure_success, map_request_error, normalize_base_url, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use intake_domain::{ChatModel, ChatRequest, FileKind, OcrDocument, OcrService, VendorError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Default Mistral API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.mistral.ai";

/// Default chat model
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

/// OCR model identifier
pub const OCR_MODEL: &str = "mistral-ocr-latest";

/// Mistral chat + OCR provider
pub struct MistralProvider {
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

impl MistralProvider {
    /// Create a new Mistral provider against the public endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, VendorError> {
        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: crate::DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Point the provider at a different base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize_base_url(endpoint);
        self
    }

    /// Set the completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the HTTP request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Result<Self, VendorError> {
        self.client = build_client(timeout_secs)?;
        self.timeout_secs = timeout_secs;
        Ok(self)
    }

    fn chat_body(&self, request: ChatRequest) -> ChatCompletionRequest<'_> {
        // Plain prompts go as a string; images as a content-part list with a data URL
        let content = match request.image {
            None => Value::String(request.prompt),
            Some(image) => json!([
                { "type": "text", "text": request.prompt },
                {
                    "type": "image_url",
                    "image_url": format!("data:{};base64,{}", image.media_type, BASE64.encode(&image.data)),
                },
            ]),
        };

        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: self.max_tokens,
        }
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response, VendorError> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;
        ensure_success(response).await
    }
}

/// Build the OCR `document` payload for a remote file
fn ocr_payload(document: &OcrDocument) -> Value {
    match document.kind {
        FileKind::Pdf => json!({
            "type": "document_url",
            "document_url": document.url,
            "document_name": document.file_name(),
        }),
        _ => json!({
            "type": "image_url",
            "image_url": document.url,
        }),
    }
}

#[async_trait]
impl ChatModel for MistralProvider {
    async fn chat(&self, request: ChatRequest) -> Result<String, VendorError> {
        debug!(model = %self.model, has_image = request.image.is_some(), "Sending request to Mistral chat API");

        let body = self.chat_body(request);
        let response = self.post_json("/v1/chat/completions", &body).await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| VendorError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            debug!(total_tokens = usage.total_tokens, "Mistral usage");
        }

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OcrService for MistralProvider {
    async fn ocr(&self, document: &OcrDocument) -> Result<Value, VendorError> {
        debug!(kind = %document.kind, name = document.file_name(), "Sending document to Mistral OCR API");

        let body = json!({
            "model": OCR_MODEL,
            "document": ocr_payload(document),
        });
        let response = self.post_json("/v1/ocr", &body).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| VendorError::InvalidResponse(format!("failed to parse OCR response: {}", e)))?;

        debug!(bytes = value.to_string().len(), "Received OCR response");
        Ok(value)
    }
}
