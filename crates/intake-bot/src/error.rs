//! Error types for the bot binary.

use intake_domain::VendorError;
use intake_extractor::ExtractorError;
use intake_supervisor::SupervisorError;
use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// An environment variable is set to something unusable
    #[error("Invalid value for {name}: {reason}")]
    InvalidVar {
        /// Variable name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The `--config` file could not be read or parsed
    #[error("Config file error: {0}")]
    File(String),
}

/// Bot errors.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram answered `ok: false`
    #[error("Telegram API error in {method}: {description}")]
    Telegram {
        /// Bot API method
        method: &'static str,
        /// Description returned by Telegram
        description: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pipeline setup or rendering error
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Vendor client construction error
    #[error(transparent)]
    Vendor(#[from] VendorError),

    /// Supervision ended without recovery
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// A one-off document could not be processed
    #[error("Processing failed: {0}")]
    Processing(String),
}
