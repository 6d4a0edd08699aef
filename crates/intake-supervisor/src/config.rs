//! Configuration for the Supervisor
//!
//! Defines the restart backoff curve, the attempt ceiling, and how long a
//! service must stay up before its failure count is forgiven.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Supervisor
///
/// # Examples
///
/// ```
/// use intake_supervisor::SupervisorConfig;
/// use std::time::Duration;
///
/// let config = SupervisorConfig::default();
/// assert_eq!(config.backoff_for(1), Duration::from_secs(1));
/// assert_eq!(config.backoff_for(3), Duration::from_secs(4));
///
/// // Backoff never exceeds the cap
/// assert_eq!(config.backoff_for(30), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay before the first restart (milliseconds)
    /// Default: 1000
    pub initial_backoff_ms: u64,

    /// Growth factor applied to the delay on each consecutive failure
    /// Default: 2.0
    pub backoff_multiplier: f64,

    /// Upper bound on any single restart delay (milliseconds)
    /// Default: 60000
    pub max_backoff_ms: u64,

    /// Consecutive failures tolerated before giving up
    /// Default: 5
    pub max_restarts: u32,

    /// Uptime after which the consecutive failure count resets (milliseconds)
    /// Default: 300000 (5 minutes)
    pub healthy_reset_ms: u64,

    /// How often a running service is health-checked (milliseconds)
    /// Default: 30000
    pub health_check_interval_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 60_000,
            max_restarts: 5,
            healthy_reset_ms: 300_000,
            health_check_interval_ms: 30_000,
        }
    }
}

impl SupervisorConfig {
    /// Aggressive restarts: short delays, more attempts, frequent checks
    ///
    /// Suitable when the upstream is known to drop connections often.
    pub fn aggressive() -> Self {
        Self {
            initial_backoff_ms: 500,
            backoff_multiplier: 1.5,
            max_backoff_ms: 10_000,
            max_restarts: 10,
            healthy_reset_ms: 60_000,
            health_check_interval_ms: 10_000,
        }
    }

    /// Lenient restarts: long delays, few attempts, infrequent checks
    pub fn lenient() -> Self {
        Self {
            initial_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 300_000,
            max_restarts: 3,
            healthy_reset_ms: 600_000,
            health_check_interval_ms: 60_000,
        }
    }

    /// Delay before restart number `attempt` (1-based)
    ///
    /// `initial * multiplier^(attempt-1)`, capped at `max_backoff_ms`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let ms = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = ms.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Get the healthy-reset cooldown as Duration
    pub fn healthy_reset(&self) -> Duration {
        Duration::from_millis(self.healthy_reset_ms)
    }

    /// Get the health check interval as Duration
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_backoff_ms == 0 {
            return Err("initial_backoff_ms must be greater than 0".to_string());
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be a finite number >= 1.0".to_string());
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err("max_backoff_ms must not be less than initial_backoff_ms".to_string());
        }
        if self.max_restarts == 0 {
            return Err("max_restarts must be greater than 0".to_string());
        }
        if self.health_check_interval_ms == 0 {
            return Err("health_check_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SupervisorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_restarts, 5);
        assert_eq!(config.healthy_reset(), Duration::from_secs(300));
        assert_eq!(config.health_check_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SupervisorConfig::aggressive().validate().is_ok());
        assert!(SupervisorConfig::lenient().validate().is_ok());
        assert!(
            SupervisorConfig::aggressive().initial_backoff_ms
                < SupervisorConfig::lenient().initial_backoff_ms
        );
    }

    #[test]
    fn test_backoff_curve() {
        let config = SupervisorConfig {
            initial_backoff_ms: 100,
            backoff_multiplier: 3.0,
            max_backoff_ms: 2_000,
            ..Default::default()
        };

        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(300));
        assert_eq!(config.backoff_for(3), Duration::from_millis(900));
        assert_eq!(config.backoff_for(4), Duration::from_millis(2_000));
        assert_eq!(config.backoff_for(u32::MAX), Duration::from_millis(2_000));
    }

    #[test]
    fn test_backoff_attempt_zero_is_initial() {
        let config = SupervisorConfig::default();
        assert_eq!(config.backoff_for(0), config.backoff_for(1));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = SupervisorConfig::default();
        config.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = SupervisorConfig::default();
        config.max_restarts = 0;
        assert!(config.validate().is_err());

        let mut config = SupervisorConfig::default();
        config.max_backoff_ms = 10;
        assert!(config.validate().is_err());

        let mut config = SupervisorConfig::default();
        config.backoff_multiplier = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SupervisorConfig::from_toml("max_restarts = 8\nbackoff_multiplier = 1.5").unwrap();
        assert_eq!(config.max_restarts, 8);
        assert_eq!(config.backoff_multiplier, 1.5);
        assert_eq!(config.initial_backoff_ms, 1_000);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SupervisorConfig::aggressive();
        let parsed = SupervisorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
