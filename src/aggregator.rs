//! Derived statistics over a snapshot.

use crate::MetricsSnapshot;

/// Mean latency reported for a provider with no samples.
///
/// Ranking treats it as the worst possible latency.
pub const NO_DATA: f64 = f64::INFINITY;

/// Read-only view computing rates and means from a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    snapshot: &'a MetricsSnapshot,
}

impl<'a> Aggregator<'a> {
    /// Creates an aggregator over `snapshot`.
    pub fn new(snapshot: &'a MetricsSnapshot) -> Self {
        Self { snapshot }
    }

    /// Fraction of successful calls, or `0.0` without data.
    pub fn success_rate(&self, source: &str) -> f64 {
        match self.snapshot.api_success_rates.get(source) {
            Some(stats) if stats.total > 0 => stats.success as f64 / stats.total as f64,
            _ => 0.0,
        }
    }

    /// Arithmetic mean of the latency window, or [`NO_DATA`].
    pub fn average_response_time(&self, source: &str) -> f64 {
        match self.snapshot.average_response_times.get(source) {
            Some(samples) if !samples.is_empty() => {
                samples.iter().sum::<f64>() / samples.len() as f64
            }
            _ => NO_DATA,
        }
    }

    /// Fraction of cache lookups that hit, or `0.0` without data.
    pub fn cache_efficiency(&self, cache_type: &str) -> f64 {
        match self.snapshot.cache_hit_rates.get(cache_type) {
            Some(stats) if stats.total > 0 => stats.hits as f64 / stats.total as f64,
            _ => 0.0,
        }
    }

    /// Total calls recorded for `source`.
    pub fn total_calls(&self, source: &str) -> u64 {
        self.snapshot
            .api_success_rates
            .get(source)
            .map(|stats| stats.total)
            .unwrap_or(0)
    }
}
