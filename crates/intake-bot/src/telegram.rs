//! Minimal Telegram Bot API client.
//!
//! Covers what the bot needs: long polling, file lookup and download, text
//! replies and document uploads. The file download URL embeds the bot token,
//! so it is never logged.

use crate::error::{BotError, Result};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Public Bot API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait passed to `getUpdates` (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram's message length limit (characters)
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Slack on top of the poll wait before the HTTP client gives up
const REQUEST_SLACK_SECS: u64 = 30;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// One inbound update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier
    pub update_id: i64,
    /// New message, if this update carries one
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message identifier within the chat
    pub message_id: i64,
    /// Originating chat
    pub chat: Chat,
    /// Text body, for text messages
    #[serde(default)]
    pub text: Option<String>,
    /// Attached file, for document messages
    #[serde(default)]
    pub document: Option<Document>,
    /// Available sizes, for photo messages
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat identifier
    pub id: i64,
}

/// A file sent as a document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Identifier for `getFile`
    pub file_id: String,
    /// Name given by the sender
    #[serde(default)]
    pub file_name: Option<String>,
}

/// One size of a photo.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    /// Identifier for `getFile`
    pub file_id: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// A file ready for download.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    /// Identifier
    pub file_id: String,
    /// Path for the file endpoint; absent when the file is unavailable
    #[serde(default)]
    pub file_path: Option<String>,
}

/// The bot's own account.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Account identifier
    pub id: i64,
    /// Username, without `@`
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    api_base: String,
    token: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramClient {
    /// Create a client against the public Bot API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let poll_timeout_secs = DEFAULT_POLL_TIMEOUT_SECS;
        Ok(Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            poll_timeout_secs,
            client: build_client(poll_timeout_secs)?,
        })
    }

    /// Point the client at a different base URL (tests, local Bot API servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the long-poll wait.
    pub fn with_poll_timeout_secs(mut self, poll_timeout_secs: u64) -> Result<Self> {
        self.client = build_client(poll_timeout_secs)?;
        self.poll_timeout_secs = poll_timeout_secs;
        Ok(self)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Public download URL for a file path returned by `getFile`.
    ///
    /// This is the remote reference handed to OCR vendors.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(strip_url)?;
        let envelope: ApiResponse<T> = response.json().await.map_err(strip_url)?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Telegram {
                method,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no result in response".to_string()),
            }),
        }
    }

    /// `getMe`: confirms the token works and the API is reachable.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", self.client.get(self.method_url("getMe"))).await
    }

    /// `getUpdates`: long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let updates: Vec<Update> = self
            .call("getUpdates", self.client.post(self.method_url("getUpdates")).json(&body))
            .await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), offset, "Received updates");
        }
        Ok(updates)
    }

    /// `getFile`: resolve a file id to a downloadable path.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let body = json!({ "file_id": file_id });
        self.call("getFile", self.client.post(self.method_url("getFile")).json(&body))
            .await
    }

    /// Download a file to `destination`.
    pub async fn download(&self, file_path: &str, destination: &Path) -> Result<u64> {
        let response = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(strip_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Telegram {
                method: "download",
                description: format!("HTTP {}", status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(strip_url)?;
        tokio::fs::write(destination, &bytes).await?;
        debug!(file_path, bytes = bytes.len(), "File downloaded");
        Ok(bytes.len() as u64)
    }

    /// `sendMessage`: plain text reply.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = json!({ "chat_id": chat_id, "text": text });
        let _: serde_json::Value = self
            .call("sendMessage", self.client.post(self.method_url("sendMessage")).json(&body))
            .await?;
        Ok(())
    }

    /// `sendDocument`: upload an in-memory file as an attachment.
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(strip_url)?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let _: serde_json::Value = self
            .call(
                "sendDocument",
                self.client.post(self.method_url("sendDocument")).multipart(form),
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

fn build_client(poll_timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(poll_timeout_secs + REQUEST_SLACK_SECS))
        .build()?)
}

/// Drop the request URL from reqwest errors; it contains the bot token.
fn strip_url(e: reqwest::Error) -> BotError {
    BotError::Http(e.without_url())
}

/// Cut `text` to Telegram's message limit on a character boundary.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    out.push('…');
    out
}
