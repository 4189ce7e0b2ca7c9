//! Runtime configuration for the quote engine.
//!
//! Every section has defaults matching the production tool; a JSON file only
//! needs the fields it overrides.

use std::path::Path;
use std::time::Duration;

use pricing::PricingConfig;
use quote_types::Platform;
use serde::{Deserialize, Serialize};
use stl_mesh::ComplexityLimits;

use crate::upload::UploadLimits;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Worker host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerConfig {
    /// A job with no response after this long is reported as failed.
    pub timeout_secs: u64,
    pub desktop: ComplexityLimits,
    pub mobile: ComplexityLimits,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            desktop: ComplexityLimits::desktop(),
            mobile: ComplexityLimits::mobile(),
        }
    }
}

impl WorkerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn limits_for(&self, platform: Platform) -> ComplexityLimits {
        match platform {
            Platform::Desktop => self.desktop,
            Platform::Mobile => self.mobile,
        }
    }
}

/// Everything the quote engine reads at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub upload: UploadLimits,
    pub pricing: PricingConfig,
    pub worker: WorkerConfig,
}

/// Errors loading a [`QuoteConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error(transparent)]
    Pricing(#[from] pricing::ConfigError),

    #[error("invalid worker config: {0}")]
    Worker(String),
}

impl QuoteConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: QuoteConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pricing.validate()?;
        if self.worker.timeout_secs == 0 {
            return Err(ConfigError::Worker("timeoutSecs must be at least 1".into()));
        }
        for (name, limits) in [("desktop", self.worker.desktop), ("mobile", self.worker.mobile)] {
            if limits.max_vertices == 0 || limits.max_triangles == 0 {
                return Err(ConfigError::Worker(format!("{name} limits must be non-zero")));
            }
        }
        if self.upload.max_bytes == 0 || self.upload.extensions.is_empty() {
            return Err(ConfigError::Worker(
                "upload limits need a size and at least one extension".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        let config = QuoteConfig::from_json_str("{}").unwrap();
        assert_eq!(config, QuoteConfig::default());
        assert_eq!(config.worker.timeout(), Duration::from_secs(60));
        assert_eq!(config.upload.max_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn partial_override() {
        let config = QuoteConfig::from_json_str(
            r#"{"worker": {"timeoutSecs": 5}, "pricing": {"colorSurcharge": 1.25}}"#,
        )
        .unwrap();
        assert_eq!(config.worker.timeout_secs, 5);
        assert_eq!(config.worker.mobile, ComplexityLimits::mobile());
        assert_eq!(config.pricing.color_surcharge, 1.25);
        assert_eq!(config.pricing.minimum_total, 200.0);
    }

    #[test]
    fn limits_follow_platform() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.limits_for(Platform::Mobile).max_vertices, 800_000);
        assert_eq!(worker.limits_for(Platform::Desktop).max_vertices, 2_000_000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            QuoteConfig::from_json_str(r#"{"worker": {"timeoutSecs": 0}}"#),
            Err(ConfigError::Worker(_))
        ));
        assert!(matches!(
            QuoteConfig::from_json_str(r#"{"pricing": {"flow": -1.0}}"#),
            Err(ConfigError::Pricing(_))
        ));
        assert!(matches!(
            QuoteConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            QuoteConfig::from_json_file("/nonexistent/quote.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
