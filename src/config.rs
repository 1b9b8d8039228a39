//! Telemetry engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, TelemetryError};

/// Tunables for recording, ranking and persistence.
///
/// Every field has a serde default, so a config file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Key under which the snapshot is persisted.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Period of the background save task, in milliseconds.
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,
    /// Maximum number of tracked popular queries.
    #[serde(default = "default_max_popular_queries")]
    pub max_popular_queries: usize,
    /// Latency window size per provider.
    #[serde(default = "default_max_latency_samples")]
    pub max_latency_samples: usize,
    /// Providers at or below this success rate are never ranked.
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,
    /// Success rates closer than this are ranked by latency instead.
    #[serde(default = "default_success_rate_tolerance")]
    pub success_rate_tolerance: f64,
    /// Number of error buckets included in a report.
    #[serde(default = "default_top_error_count")]
    pub top_error_count: usize,
}

fn default_storage_key() -> String {
    "performanceMetrics".to_string()
}

fn default_save_interval_ms() -> u64 {
    30_000
}

fn default_max_popular_queries() -> usize {
    50
}

fn default_max_latency_samples() -> usize {
    100
}

fn default_min_success_rate() -> f64 {
    0.5
}

fn default_success_rate_tolerance() -> f64 {
    0.1
}

fn default_top_error_count() -> usize {
    10
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            save_interval_ms: default_save_interval_ms(),
            max_popular_queries: default_max_popular_queries(),
            max_latency_samples: default_max_latency_samples(),
            min_success_rate: default_min_success_rate(),
            success_rate_tolerance: default_success_rate_tolerance(),
            top_error_count: default_top_error_count(),
        }
    }
}

impl TelemetryConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persistence key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Sets the background save period.
    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the popular query cap.
    pub fn with_max_popular_queries(mut self, max: usize) -> Self {
        self.max_popular_queries = max;
        self
    }

    /// Sets the per-provider latency window size.
    pub fn with_max_latency_samples(mut self, max: usize) -> Self {
        self.max_latency_samples = max;
        self
    }

    /// Sets the minimum success rate for ranking.
    pub fn with_min_success_rate(mut self, rate: f64) -> Self {
        self.min_success_rate = rate;
        self
    }

    /// Sets the success rate tie tolerance.
    pub fn with_success_rate_tolerance(mut self, tolerance: f64) -> Self {
        self.success_rate_tolerance = tolerance;
        self
    }

    /// Sets how many error buckets a report includes.
    pub fn with_top_error_count(mut self, count: usize) -> Self {
        self.top_error_count = count;
        self
    }

    /// Returns the background save period.
    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    /// Checks that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.is_empty() {
            return Err(TelemetryError::InvalidConfig(
                "storage_key must not be empty".to_string(),
            ));
        }
        if self.save_interval_ms == 0 {
            return Err(TelemetryError::InvalidConfig(
                "save_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.storage_key, "performanceMetrics");
        assert_eq!(config.save_interval_ms, 30_000);
        assert_eq!(config.max_popular_queries, 50);
        assert_eq!(config.max_latency_samples, 100);
        assert_eq!(config.min_success_rate, 0.5);
        assert_eq!(config.success_rate_tolerance, 0.1);
        assert_eq!(config.top_error_count, 10);
    }

    #[test]
    fn test_config_new_matches_default() {
        assert_eq!(TelemetryConfig::new(), TelemetryConfig::default());
    }

    #[test]
    fn test_config_builder_chain() {
        let config = TelemetryConfig::new()
            .with_storage_key("metrics")
            .with_save_interval(Duration::from_secs(5))
            .with_max_popular_queries(3)
            .with_max_latency_samples(4)
            .with_min_success_rate(0.25)
            .with_success_rate_tolerance(0.05)
            .with_top_error_count(2);

        assert_eq!(config.storage_key, "metrics");
        assert_eq!(config.save_interval(), Duration::from_secs(5));
        assert_eq!(config.max_popular_queries, 3);
        assert_eq!(config.max_latency_samples, 4);
        assert_eq!(config.min_success_rate, 0.25);
        assert_eq!(config.success_rate_tolerance, 0.05);
        assert_eq!(config.top_error_count, 2);
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let json = r#"{"storage_key":"custom","save_interval_ms":1000}"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.storage_key, "custom");
        assert_eq!(config.save_interval_ms, 1000);
        assert_eq!(config.max_popular_queries, 50); // default
        assert_eq!(config.min_success_rate, 0.5); // default
    }

    #[test]
    fn test_config_deserialization_empty_object() {
        let config: TelemetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_config_validate() {
        assert!(TelemetryConfig::default().validate().is_ok());

        let zero = TelemetryConfig::new().with_save_interval(Duration::ZERO);
        assert!(matches!(
            zero.validate(),
            Err(TelemetryError::InvalidConfig(_))
        ));

        let parsed: TelemetryConfig = serde_json::from_str(r#"{"save_interval_ms":0}"#).unwrap();
        assert!(parsed.validate().is_err());

        let unnamed = TelemetryConfig::new().with_storage_key("");
        assert!(unnamed.validate().is_err());
    }
}
