//! Invoice Intake Supervisor
//!
//! Keeps the bot's long-running chat transport alive by restarting it with
//! exponential backoff.
//!
//! # Overview
//!
//! The Supervisor is responsible for:
//! - **Lifecycle**: starting a [`Service`], stopping it on failure or shutdown
//! - **Health checks**: probing the running service on a fixed interval
//! - **Backoff**: `initial * multiplier^(attempt-1)`, capped at a maximum delay
//! - **Giving up**: returning [`SupervisorError::GaveUp`] after too many
//!   consecutive failures, so an operator can step in
//! - **Metrics**: counting starts, crashes and health failures
//!
//! A run that stays up for `healthy_reset_ms` resets the consecutive failure
//! count, so a service that crashes once a day never exhausts its budget.
//!
//! The supervisor guards the transport only. Individual document requests
//! are never retried here.
//!
//! # Usage
//!
//! ```no_run
//! use intake_supervisor::{Service, Supervisor, SupervisorConfig};
//! use async_trait::async_trait;
//!
//! struct Poller;
//!
//! #[async_trait]
//! impl Service for Poller {
//!     fn name(&self) -> &str { "poller" }
//!     async fn start(&self) -> anyhow::Result<()> { Ok(()) }
//!     async fn stop(&self) {}
//!     async fn health_check(&self) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut supervisor = Supervisor::new(SupervisorConfig::default())?;
//!     supervisor.run_until_ctrl_c(&Poller).await?;
//!     println!("{}", supervisor.metrics().summary());
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [supervisor]
//! initial_backoff_ms = 1000
//! backoff_multiplier = 2.0
//! max_backoff_ms = 60000
//! max_restarts = 5
//! healthy_reset_ms = 300000
//! health_check_interval_ms = 30000
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod service;
mod supervisor;

pub use config::SupervisorConfig;
pub use error::SupervisorError;
pub use metrics::SupervisorMetrics;
pub use service::Service;
pub use supervisor::Supervisor;
