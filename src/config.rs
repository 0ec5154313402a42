//! TOML configuration for the collector and its ambient services

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::*;
use crate::logging::{LogRotation, LoggingConfig};
use crate::performance::{CollectorConfig, ResourceFilter, ThresholdOverrides};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// `[monitoring]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringTomlConfig {
    pub development_mode: Option<bool>,
    pub buffer_capacity: Option<usize>,
    pub memory_sample_interval_secs: Option<u64>,
    pub memory_sampling_cutoff_secs: Option<u64>,
    pub resource_size_threshold_bytes: Option<u64>,
    pub resource_duration_threshold_ms: Option<f64>,
}

/// `[preferences]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesTomlConfig {
    pub path: Option<String>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingTomlConfig {
    pub log_dir: Option<String>,
    pub level_filter: Option<String>,
    pub rotation: Option<String>, // "daily", "hourly", or "size:<MB>"
    pub console_timestamps: Option<bool>,
    pub file_json_format: Option<bool>,
    pub cleanup_days: Option<u32>,
}

/// Full TOML configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub monitoring: MonitoringTomlConfig,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    #[serde(default)]
    pub preferences: PreferencesTomlConfig,
    #[serde(default)]
    pub logging: LoggingTomlConfig,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub collector: CollectorConfig,
    pub preferences_path: PathBuf,
    pub logging: LoggingConfig,
    pub log_cleanup_days: Option<u32>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            logging: LoggingConfig::default(),
            log_cleanup_days: None,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        Self::from_toml_config(toml_config)
    }

    fn from_toml_config(toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let monitoring = toml_config.monitoring;

        let buffer_capacity = monitoring.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);
        if buffer_capacity == 0 {
            return Err(ConfigError::Validation("monitoring.buffer_capacity must be at least 1".to_string()));
        }
        let sample_secs = monitoring
            .memory_sample_interval_secs
            .unwrap_or(DEFAULT_MEMORY_SAMPLE_INTERVAL_SECONDS);
        if sample_secs == 0 {
            return Err(ConfigError::Validation(
                "monitoring.memory_sample_interval_secs must be at least 1".to_string(),
            ));
        }
        for (key, value) in [
            ("api_response_time", toml_config.thresholds.api_response_time),
            ("component_render_time", toml_config.thresholds.component_render_time),
            ("page_load_time", toml_config.thresholds.page_load_time),
            ("memory_usage", toml_config.thresholds.memory_usage),
        ] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ConfigError::Validation(format!("thresholds.{} must be a non-negative number", key)));
            }
        }

        let default_filter = ResourceFilter::default();
        let collector = CollectorConfig {
            development_mode: monitoring.development_mode.unwrap_or(defaults.collector.development_mode),
            buffer_capacity,
            resource_filter: ResourceFilter {
                min_transfer_size: monitoring
                    .resource_size_threshold_bytes
                    .unwrap_or(default_filter.min_transfer_size),
                min_duration_ms: monitoring
                    .resource_duration_threshold_ms
                    .unwrap_or(default_filter.min_duration_ms),
            },
            memory_sample_interval: Duration::from_secs(sample_secs),
            memory_sampling_cutoff: Duration::from_secs(
                monitoring
                    .memory_sampling_cutoff_secs
                    .unwrap_or(DEFAULT_MEMORY_SAMPLING_CUTOFF_SECONDS),
            ),
            thresholds: toml_config.thresholds,
        };

        let log = toml_config.logging;
        let logging = LoggingConfig {
            log_dir: log.log_dir.unwrap_or(defaults.logging.log_dir),
            level_filter: log.level_filter.unwrap_or(defaults.logging.level_filter),
            rotation: match log.rotation.as_deref() {
                Some(rotation) => parse_rotation(rotation)?,
                None => defaults.logging.rotation,
            },
            console_timestamps: log.console_timestamps.unwrap_or(defaults.logging.console_timestamps),
            file_json_format: log.file_json_format.unwrap_or(defaults.logging.file_json_format),
        };

        Ok(Self {
            collector,
            preferences_path: toml_config
                .preferences
                .path
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
            logging,
            log_cleanup_days: log.cleanup_days,
        })
    }
}

fn parse_rotation(value: &str) -> Result<LogRotation, ConfigError> {
    match value {
        "daily" => Ok(LogRotation::Daily),
        "hourly" => Ok(LogRotation::Hourly),
        other => other
            .strip_prefix("size:")
            .and_then(|mb| mb.parse::<u64>().ok())
            .map(LogRotation::SizeBased)
            .ok_or_else(|| ConfigError::Validation(format!("unknown log rotation '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TelemetryConfig::from_toml_str("").unwrap();
        assert_eq!(config.collector.buffer_capacity, 1000);
        assert_eq!(config.collector.memory_sample_interval, Duration::from_secs(30));
        assert!(config.collector.thresholds.is_empty());
        assert_eq!(config.preferences_path, PathBuf::from("data/preferences"));
        assert!(matches!(config.logging.rotation, LogRotation::Daily));
    }

    #[test]
    fn test_full_config() {
        let config = TelemetryConfig::from_toml_str(
            r#"
            [monitoring]
            development_mode = false
            buffer_capacity = 250
            memory_sample_interval_secs = 10
            resource_duration_threshold_ms = 250.0

            [thresholds]
            api_response_time = 800.0

            [preferences]
            path = "/tmp/prefs"

            [logging]
            rotation = "size:20"
            cleanup_days = 7
            "#,
        )
        .unwrap();

        assert!(!config.collector.development_mode);
        assert_eq!(config.collector.buffer_capacity, 250);
        assert_eq!(config.collector.resource_filter.min_duration_ms, 250.0);
        assert_eq!(config.collector.resource_filter.min_transfer_size, 10_000);
        assert_eq!(config.collector.thresholds.api_response_time, Some(800.0));
        assert_eq!(config.collector.thresholds.memory_usage, None);
        assert_eq!(config.preferences_path, PathBuf::from("/tmp/prefs"));
        assert!(matches!(config.logging.rotation, LogRotation::SizeBased(20)));
        assert_eq!(config.log_cleanup_days, Some(7));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            TelemetryConfig::from_toml_str("[monitoring]\nbuffer_capacity = 0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            TelemetryConfig::from_toml_str("[thresholds]\nmemory_usage = -1.0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            TelemetryConfig::from_toml_str("[logging]\nrotation = \"weekly\"\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            TelemetryConfig::from_toml_str("[monitoring\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
