//! Error types for Supervisor operations

use thiserror::Error;

/// Errors that can end supervision
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupervisorError {
    /// The service failed too many times in a row; manual intervention needed
    #[error("Service '{service}' gave up after {attempts} consecutive failures: {last_error}")]
    GaveUp {
        /// Service name
        service: String,
        /// Consecutive failures observed
        attempts: u32,
        /// The failure that exhausted the budget
        last_error: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
