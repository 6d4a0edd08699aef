//! Invoice bot library.
//!
//! Telegram adapter around the intake pipeline: environment configuration,
//! the Bot API client, file staging, per-update handling, and the polling
//! service the supervisor keeps alive.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod service;
pub mod staging;
pub mod telegram;

pub use cli::{Cli, Command};
pub use config::{BackendKind, BotConfig, FileSettings};
pub use error::{BotError, ConfigError, Result};
pub use handler::Handler;
pub use service::PollingService;
pub use telegram::TelegramClient;
