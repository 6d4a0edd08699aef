//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceiling for any single vendor call (seconds)
pub const MAX_VENDOR_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Longest image side after optimization (pixels); larger images are shrunk
    pub max_image_dimension: u32,

    /// JPEG quality for images kept at their original size
    pub jpeg_quality: u8,

    /// JPEG quality for images that were shrunk
    pub resized_jpeg_quality: u8,

    /// Maximum time for a single LLM or OCR call (seconds)
    pub vendor_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the vendor timeout as a Duration
    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_secs(self.vendor_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_image_dimension == 0 {
            return Err("max_image_dimension must be greater than 0".to_string());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }
        if self.resized_jpeg_quality == 0 || self.resized_jpeg_quality > 100 {
            return Err("resized_jpeg_quality must be between 1 and 100".to_string());
        }
        if self.vendor_timeout_secs == 0 {
            return Err("vendor_timeout_secs must be greater than 0".to_string());
        }
        if self.vendor_timeout_secs > MAX_VENDOR_TIMEOUT_SECS {
            return Err(format!(
                "vendor_timeout_secs cannot exceed {}",
                MAX_VENDOR_TIMEOUT_SECS
            ));
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 1500,
            jpeg_quality: 85,
            resized_jpeg_quality: 80,
            vendor_timeout_secs: MAX_VENDOR_TIMEOUT_SECS,
        }
    }
}

impl ExtractorConfig {
    /// Compact preset: smaller images and a shorter timeout for slow links
    pub fn compact() -> Self {
        Self {
            max_image_dimension: 1024,
            jpeg_quality: 80,
            resized_jpeg_quality: 75,
            vendor_timeout_secs: 30,
        }
    }

    /// High-fidelity preset: larger, sharper images for dense scans
    pub fn high_fidelity() -> Self {
        Self {
            max_image_dimension: 2000,
            jpeg_quality: 92,
            resized_jpeg_quality: 88,
            vendor_timeout_secs: MAX_VENDOR_TIMEOUT_SECS,
        }
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
