//! Metrics collection for Supervisor operations

use std::time::Duration;

/// Metrics collected while supervising one service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisorMetrics {
    /// Times the service was started (initial start included)
    pub starts: usize,

    /// Times the service exited with an error
    pub crashes: usize,

    /// Times a health check failed or timed out
    pub health_failures: usize,

    /// Times the consecutive failure count was forgiven after a healthy run
    pub resets: usize,

    /// Most recent failure message
    pub last_error: Option<String>,

    /// Accumulated time the service spent running
    pub total_uptime: Duration,
}

impl SupervisorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a service start
    pub fn record_start(&mut self) {
        self.starts += 1;
    }

    /// Record a crash
    pub fn record_crash(&mut self, error: impl Into<String>) {
        self.crashes += 1;
        self.last_error = Some(error.into());
    }

    /// Record a failed health check
    pub fn record_health_failure(&mut self, error: impl Into<String>) {
        self.health_failures += 1;
        self.last_error = Some(error.into());
    }

    /// Record a failure-count reset
    pub fn record_reset(&mut self) {
        self.resets += 1;
    }

    /// Add one run's uptime
    pub fn record_uptime(&mut self, uptime: Duration) {
        self.total_uptime += uptime;
    }

    /// Total failures of either kind
    pub fn total_failures(&self) -> usize {
        self.crashes + self.health_failures
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Supervisor Metrics Summary".to_string(),
            "==========================".to_string(),
            format!("Starts: {}", self.starts),
            format!("Crashes: {}", self.crashes),
            format!("Health check failures: {}", self.health_failures),
            format!("Failure count resets: {}", self.resets),
            format!("Total uptime: {}s", self.total_uptime.as_secs()),
        ];

        if let Some(error) = &self.last_error {
            lines.push(format!("Last error: {}", error));
        }

        lines.join("\n")
    }
}
