//! Per-update handling: stage the file, run the pipeline, deliver the reply.

use crate::error::{BotError, Result};
use crate::staging::{Archive, StagedFile, Staging};
use crate::telegram::{truncate_message, PhotoSize, TelegramClient, Update};
use intake_domain::{ProcessingResult, RequestId};
use intake_extractor::{report, Extractor};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reply to `/start`
pub const WELCOME_MESSAGE: &str = "Welcome! Please send me a document to process.";

/// MIME type of the spreadsheet attachment
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// An inbound file, before staging.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Sent as a document
    Document {
        /// Telegram file id
        file_id: String,
        /// Name given by the sender
        file_name: Option<String>,
    },
    /// Sent as a photo; the largest size was chosen
    Photo {
        /// Telegram file id
        file_id: String,
    },
}

impl Inbound {
    fn file_id(&self) -> &str {
        match self {
            Inbound::Document { file_id, .. } | Inbound::Photo { file_id } => file_id,
        }
    }

    /// Name used for reply attachments and archives
    pub fn display_name(&self) -> &str {
        match self {
            Inbound::Document { file_name, .. } => file_name.as_deref().unwrap_or("document"),
            Inbound::Photo { .. } => "photo.jpg",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Inbound::Document { .. } => "document",
            Inbound::Photo { .. } => "photo",
        }
    }

    fn stage(&self, staging: &Staging, id: RequestId) -> StagedFile {
        match self {
            Inbound::Document { file_name, .. } => staging.document(id, file_name.as_deref()),
            Inbound::Photo { .. } => staging.photo(id),
        }
    }
}

/// The largest photo size by pixel count.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
}

/// What goes back to the chat for one processed file.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The invoice was parsed
    Parsed {
        /// Message text: the JSON, cut to the message limit
        text: String,
        /// Full pretty JSON for the `.json` attachment
        json: String,
        /// `.xlsx` attachment, when rendering succeeded
        workbook: Option<Vec<u8>>,
    },
    /// Processing failed; the text is `Error: <message>`
    Failed(String),
}

impl Reply {
    /// Render a pipeline outcome.
    pub fn from_result(result: &ProcessingResult) -> Self {
        match result {
            ProcessingResult::Success(document) => match report::to_json(document) {
                Ok(json) => {
                    let workbook = match report::to_workbook(document) {
                        Ok(bytes) => Some(bytes),
                        Err(e) => {
                            warn!(error = %e, "Failed to render workbook, sending JSON only");
                            None
                        }
                    };
                    Reply::Parsed {
                        text: truncate_message(&json),
                        json,
                        workbook,
                    }
                }
                Err(e) => Reply::Failed(format!("Error: {}", e)),
            },
            ProcessingResult::Failure(message) if message.is_empty() => {
                Reply::Failed("Error: Unknown error occurred".to_string())
            }
            ProcessingResult::Failure(message) => Reply::Failed(format!("Error: {}", message)),
        }
    }
}

/// Handles updates for every chat.
///
/// Shared behind an `Arc`; each update runs in its own task and nothing here
/// is mutated after construction.
#[derive(Debug)]
pub struct Handler {
    telegram: TelegramClient,
    extractor: Extractor,
    staging: Staging,
    archive: Option<Archive>,
}

impl Handler {
    /// Create a handler
    pub fn new(telegram: TelegramClient, extractor: Extractor, staging: Staging) -> Self {
        Self {
            telegram,
            extractor,
            staging,
            archive: None,
        }
    }

    /// Also archive every JSON reply
    pub fn with_archive(mut self, archive: Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Handle one update; never fails, errors are reported to the chat and logged.
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Ignoring update without a message");
            return;
        };
        let chat_id = message.chat.id;

        let inbound = if let Some(document) = message.document {
            Inbound::Document {
                file_id: document.file_id,
                file_name: document.file_name,
            }
        } else if let Some(photos) = message.photo {
            match largest_photo(&photos) {
                Some(photo) => Inbound::Photo {
                    file_id: photo.file_id.clone(),
                },
                None => {
                    warn!(chat_id, "Invalid photo received");
                    self.send_text(chat_id, "Please send a valid photo.").await;
                    return;
                }
            }
        } else if message.text.as_deref().is_some_and(is_start_command) {
            info!(chat_id, "New user started bot");
            self.send_text(chat_id, WELCOME_MESSAGE).await;
            return;
        } else {
            debug!(chat_id, "Ignoring message without a file");
            return;
        };

        self.process(chat_id, inbound).await;
    }

    async fn process(&self, chat_id: i64, inbound: Inbound) {
        let id = RequestId::new();
        info!(
            chat_id,
            request_id = %id,
            kind = inbound.label(),
            name = inbound.display_name(),
            "Processing inbound file"
        );

        // The staged file lives until the reply has been sent
        let (_staged, result) = match self.fetch_and_run(id, &inbound).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(chat_id, request_id = %id, error = %e, "Failed to fetch inbound file");
                let text = format!("Error processing {}. Please try again.", inbound.label());
                self.send_text(chat_id, &text).await;
                return;
            }
        };

        if let Err(e) = self.deliver(chat_id, id, inbound.display_name(), &result).await {
            warn!(chat_id, request_id = %id, error = %e, "Failed to deliver reply");
        }
    }

    async fn fetch_and_run(&self, id: RequestId, inbound: &Inbound) -> Result<(StagedFile, ProcessingResult)> {
        let file = self.telegram.get_file(inbound.file_id()).await?;
        let file_path = file.file_path.ok_or_else(|| BotError::Telegram {
            method: "getFile",
            description: "file path not found".to_string(),
        })?;

        let staged = inbound.stage(&self.staging, id);
        self.telegram.download(&file_path, staged.path()).await?;

        let remote_ref = self.telegram.file_url(&file_path);
        let result = self
            .extractor
            .process_document(staged.path(), Some(&remote_ref))
            .await;
        Ok((staged, result))
    }

    async fn deliver(
        &self,
        chat_id: i64,
        id: RequestId,
        display_name: &str,
        result: &ProcessingResult,
    ) -> Result<()> {
        match Reply::from_result(result) {
            Reply::Parsed { text, json, workbook } => {
                if let Some(archive) = &self.archive {
                    if let Err(e) = archive.store(id, display_name, &json).await {
                        warn!(chat_id, error = %e, "Failed to archive reply");
                    }
                }

                let stem = attachment_stem(display_name);
                self.telegram.send_message(chat_id, &text).await?;
                self.telegram
                    .send_document(chat_id, &format!("{}.json", stem), "application/json", json.into_bytes())
                    .await?;
                if let Some(bytes) = workbook {
                    self.telegram
                        .send_document(chat_id, &format!("{}.xlsx", stem), XLSX_MIME, bytes)
                        .await?;
                }
                info!(chat_id, "Successfully processed document");
            }
            Reply::Failed(text) => {
                self.telegram.send_message(chat_id, &text).await?;
                warn!(chat_id, reply = %text, "Reported processing failure");
            }
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.telegram.send_message(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to send message");
        }
    }
}

fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|cmd| cmd == "/start" || cmd.starts_with("/start@"))
}

fn attachment_stem(display_name: &str) -> String {
    let sanitized = crate::staging::sanitize_file_name(display_name);
    Path::new(&sanitized)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_domain::{DocumentItem, ParsedDocument};

    fn photo(id: &str, width: u32, height: u32) -> PhotoSize {
        PhotoSize {
            file_id: id.into(),
            width,
            height,
        }
    }

    #[test]
    fn test_largest_photo_by_area() {
        let sizes = vec![photo("a", 90, 60), photo("c", 1280, 853), photo("b", 320, 213)];
        assert_eq!(largest_photo(&sizes).unwrap().file_id, "c");
        assert!(largest_photo(&[]).is_none());
    }

    #[test]
    fn test_start_command() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@invoice_bot hello"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("hello /start"));
    }

    #[test]
    fn test_attachment_stem() {
        assert_eq!(attachment_stem("рахунок 12.pdf"), "рахунок 12");
        assert_eq!(attachment_stem("photo.jpg"), "photo");
        assert_eq!(attachment_stem("../x.csv"), "x");
    }

    #[test]
    fn test_failure_reply() {
        let reply = Reply::from_result(&ProcessingResult::failure("vendor returned HTTP 429: slow down"));
        assert_eq!(reply, Reply::Failed("Error: vendor returned HTTP 429: slow down".into()));

        let reply = Reply::from_result(&ProcessingResult::failure(""));
        assert_eq!(reply, Reply::Failed("Error: Unknown error occurred".into()));
    }

    #[test]
    fn test_success_reply_has_attachments() {
        let document = ParsedDocument {
            invoice_number: "Л-25/46".into(),
            items: vec![DocumentItem {
                name: "Кирпич".into(),
                quantity: 10.0,
                ..Default::default()
            }],
            ..Default::default()
        };

        match Reply::from_result(&ProcessingResult::Success(document)) {
            Reply::Parsed { text, json, workbook } => {
                assert_eq!(text, json);
                assert!(json.contains("\"invoice_number\": \"Л-25/46\""));
                assert!(workbook.unwrap().starts_with(b"PK"));
            }
            other => panic!("expected parsed reply, got {:?}", other),
        }
    }

    #[test]
    fn test_long_json_is_truncated_in_message_only() {
        let document = ParsedDocument {
            items: (0..200)
                .map(|i| DocumentItem {
                    name: format!("Позиція {}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        match Reply::from_result(&ProcessingResult::Success(document)) {
            Reply::Parsed { text, json, .. } => {
                assert!(json.chars().count() > crate::telegram::MAX_MESSAGE_CHARS);
                assert_eq!(text.chars().count(), crate::telegram::MAX_MESSAGE_CHARS);
            }
            other => panic!("expected parsed reply, got {:?}", other),
        }
    }
}
