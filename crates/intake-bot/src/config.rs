//! Configuration for the bot.
//!
//! Secrets and deployment settings come from the environment (optionally
//! seeded from `.env`); tunables come from an optional TOML file with
//! `[extractor]` and `[supervisor]` tables.

use crate::error::ConfigError;
use intake_domain::VendorError;
use intake_extractor::{Backend, ExtractorConfig};
use intake_llm::{claude, mistral, ClaudeProvider, MistralProvider, DEFAULT_MAX_TOKENS};
use intake_supervisor::SupervisorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Telegram bot token
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Extraction backend selector
pub const INTAKE_BACKEND: &str = "INTAKE_BACKEND";
/// Anthropic API key
pub const CLAUDE_API_KEY: &str = "CLAUDE_API_KEY";
/// Mistral API key
pub const MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";
/// Chat model override
pub const INTAKE_MODEL: &str = "INTAKE_MODEL";
/// Completion token limit
pub const INTAKE_MAX_TOKENS: &str = "INTAKE_MAX_TOKENS";
/// Staging directory for downloaded files
pub const INTAKE_UPLOADS_DIR: &str = "INTAKE_UPLOADS_DIR";
/// Optional directory for archived JSON replies
pub const INTAKE_ARCHIVE_DIR: &str = "INTAKE_ARCHIVE_DIR";

/// Default staging directory
pub const DEFAULT_UPLOADS_DIR: &str = "./uploads";

/// Which vendor pipeline the bot uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Claude, sending images directly as attachments
    Claude,
    /// Mistral, running OCR by URL before the chat call
    Mistral,
}

impl BackendKind {
    /// Environment variable holding this vendor's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            BackendKind::Claude => CLAUDE_API_KEY,
            BackendKind::Mistral => MISTRAL_API_KEY,
        }
    }

    /// Chat model used when `INTAKE_MODEL` is unset
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Claude => claude::DEFAULT_MODEL,
            BackendKind::Mistral => mistral::DEFAULT_MODEL,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Claude => "claude",
            BackendKind::Mistral => "mistral",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(BackendKind::Claude),
            "mistral" => Ok(BackendKind::Mistral),
            other => Err(format!("unknown backend '{}', expected 'claude' or 'mistral'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables loaded from `--config <file.toml>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Pipeline tunables
    pub extractor: ExtractorConfig,
    /// Restart policy for the Telegram poller
    pub supervisor: SupervisorConfig,
}

impl FileSettings {
    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: FileSettings = toml::from_str(toml_str)
            .map_err(|e| ConfigError::File(format!("failed to parse TOML: {}", e)))?;
        settings
            .extractor
            .validate()
            .map_err(|e| ConfigError::File(format!("[extractor] {}", e)))?;
        settings
            .supervisor
            .validate()
            .map_err(|e| ConfigError::File(format!("[supervisor] {}", e)))?;
        Ok(settings)
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }
}

/// Resolved bot configuration.
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token; only `run` needs it
    pub telegram_token: Option<String>,
    /// Selected vendor pipeline
    pub backend: BackendKind,
    /// API key for the selected vendor
    pub api_key: String,
    /// Chat model identifier
    pub model: String,
    /// Completion token limit
    pub max_tokens: u32,
    /// Where inbound files are staged
    pub uploads_dir: PathBuf,
    /// Where JSON replies are archived, if anywhere
    pub archive_dir: Option<PathBuf>,
    /// Pipeline tunables
    pub extractor: ExtractorConfig,
    /// Restart policy
    pub supervisor: SupervisorConfig,
}

impl BotConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env(settings: FileSettings) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), settings)
    }

    /// Resolve configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, settings: FileSettings) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match var(INTAKE_BACKEND) {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidVar {
                name: INTAKE_BACKEND,
                reason,
            })?,
            None => BackendKind::Mistral,
        };

        let api_key = var(backend.api_key_var()).ok_or(ConfigError::MissingVar(backend.api_key_var()))?;

        let max_tokens = match var(INTAKE_MAX_TOKENS) {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: INTAKE_MAX_TOKENS,
                        reason: format!("'{}' is not a positive integer", value),
                    })
                }
            },
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            telegram_token: var(TELEGRAM_BOT_TOKEN),
            backend,
            api_key,
            model: var(INTAKE_MODEL).unwrap_or_else(|| backend.default_model().to_string()),
            max_tokens,
            uploads_dir: var(INTAKE_UPLOADS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR)),
            archive_dir: var(INTAKE_ARCHIVE_DIR).map(PathBuf::from),
            extractor: settings.extractor,
            supervisor: settings.supervisor,
        })
    }

    /// The Telegram token, required to run the bot.
    pub fn telegram_token(&self) -> Result<&str, ConfigError> {
        self.telegram_token
            .as_deref()
            .ok_or(ConfigError::MissingVar(TELEGRAM_BOT_TOKEN))
    }

    /// Build the extraction backend for the selected vendor.
    pub fn build_backend(&self) -> Result<Backend, VendorError> {
        let timeout_secs = self.extractor.vendor_timeout_secs;
        match self.backend {
            BackendKind::Claude => {
                let chat = ClaudeProvider::new(&self.api_key, &self.model)?
                    .with_max_tokens(self.max_tokens)
                    .with_timeout_secs(timeout_secs)?;
                Ok(Backend::multimodal(chat))
            }
            BackendKind::Mistral => {
                let provider = || -> Result<MistralProvider, VendorError> {
                    MistralProvider::new(&self.api_key, &self.model)?
                        .with_max_tokens(self.max_tokens)
                        .with_timeout_secs(timeout_secs)
                };
                Ok(Backend::ocr_then_chat(provider()?, provider()?))
            }
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<redacted>"))
            .field("backend", &self.backend)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("uploads_dir", &self.uploads_dir)
            .field("archive_dir", &self.archive_dir)
            .field("extractor", &self.extractor)
            .field("supervisor", &self.supervisor)
            .finish()
    }
}
