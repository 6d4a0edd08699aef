//! Claude Provider Implementation
//!
//! Multimodal chat over the Anthropic Messages API. A request carries the
//! instruction prompt as a text block and, for photographed or scanned
//! invoices, the optimized image as a base64 block.
//!
//! # Examples
//!
//! ```no_run
//! use intake_llm::ClaudeProvider;
//!
//! # fn example() -> Result<(), intake_domain::VendorError> {
//! let provider = ClaudeProvider::new("sk-ant-...", "claude-3-7-sonnet-20250219")?
//!     .with_max_tokens(4000);
//! # Ok(())
//! # }
//! ```

use crate::http::{build_client, ensure_success, map_request_error, normalize_base_url, DEFAULT_TIMEOUT_SECS};
use crate::SYSTEM_PROMPT;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use intake_domain::{ChatModel, ChatRequest, VendorError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct ClaudeProvider {
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl ClaudeProvider {
    /// Create a new Claude provider against the public endpoint
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

    /// Point the provider at a different base URL (proxies, tests)
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

    fn build_body(&self, request: ChatRequest) -> MessagesRequest<'_> {
        let mut content = vec![ContentBlock::Text {
            text: request.prompt,
        }];
        if let Some(image) = request.image {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: image.media_type,
                    data: BASE64.encode(&image.data),
                },
            });
        }

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content,
            }],
        }
    }
}

#[async_trait]
impl ChatModel for ClaudeProvider {
    async fn chat(&self, request: ChatRequest) -> Result<String, VendorError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let has_image = request.image.is_some();
        let body = self.build_body(request);

        debug!(model = %self.model, has_image, "Sending request to Claude Messages API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;
        let response = ensure_success(response).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| VendorError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Claude usage"
            );
        }

        let first = parsed
            .content
            .into_iter()
            .next()
            .ok_or_else(|| VendorError::InvalidResponse("Claude API returned an empty response".to_string()))?;

        match (first.kind.as_str(), first.text) {
            ("text", Some(text)) => Ok(text),
            (kind, _) => Err(VendorError::InvalidResponse(format!(
                "Claude API returned an unsupported content type: {}",
                kind
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = ClaudeProvider::new("key", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model_id(), DEFAULT_MODEL);
        assert_eq!(provider.max_tokens, crate::DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_builder_settings() {
        let provider = ClaudeProvider::new("key", "m")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9999/")
            .with_max_tokens(1234)
            .with_timeout_secs(5)
            .unwrap();
        assert_eq!(provider.endpoint, "http://127.0.0.1:9999");
        assert_eq!(provider.max_tokens, 1234);
        assert_eq!(provider.timeout_secs, 5);
    }

    #[test]
    fn test_body_with_image_has_two_blocks() {
        let provider = ClaudeProvider::new("key", "m").unwrap();
        let body = provider.build_body(ChatRequest::with_image("prompt", "image/jpeg", vec![0xff, 0xd8]));
        let json = serde_json::to_value(&body).unwrap();

        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "prompt");
        assert_eq!(content[1]["type"], "image");
        assert_eq!(content[1]["source"]["type"], "base64");
        assert_eq!(content[1]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[1]["source"]["data"], "/9g=");
        assert_eq!(json["system"], SYSTEM_PROMPT);
    }
}
