//! Human-readable performance report.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Aggregator, MetricsSnapshot};

/// Per-provider call statistics, preformatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPerformance {
    /// Success rate, e.g. `"87.5%"`.
    pub success_rate: String,
    /// Mean latency, e.g. `"240ms"`, or `"n/a"` without samples.
    pub avg_response_time: String,
    pub total_calls: u64,
}

/// Per-cache statistics, preformatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePerformance {
    /// Hit rate, e.g. `"75.0%"`.
    pub hit_rate: String,
    pub total_requests: u64,
}

/// One `"<provider>:<errorType>"` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCount {
    pub key: String,
    pub count: u64,
}

/// Summary of every derived statistic at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_searches: u64,
    pub api_performance: BTreeMap<String, ApiPerformance>,
    pub cache_performance: BTreeMap<String, CachePerformance>,
    /// Highest error buckets first.
    pub top_errors: Vec<ErrorCount>,
    /// Minutes since the measurement window started.
    pub uptime_minutes: i64,
}

impl PerformanceReport {
    /// Builds a report from `snapshot` as of `now`, keeping at most
    /// `top_error_count` error buckets.
    pub fn from_snapshot(
        snapshot: &MetricsSnapshot,
        top_error_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let aggregator = Aggregator::new(snapshot);

        let api_performance = snapshot
            .api_success_rates
            .iter()
            .map(|(source, stats)| {
                let performance = ApiPerformance {
                    success_rate: format_percent(aggregator.success_rate(source)),
                    avg_response_time: format_millis(aggregator.average_response_time(source)),
                    total_calls: stats.total,
                };
                (source.clone(), performance)
            })
            .collect();

        let cache_performance = snapshot
            .cache_hit_rates
            .iter()
            .map(|(cache_type, stats)| {
                let performance = CachePerformance {
                    hit_rate: format_percent(aggregator.cache_efficiency(cache_type)),
                    total_requests: stats.total,
                };
                (cache_type.clone(), performance)
            })
            .collect();

        let mut top_errors: Vec<ErrorCount> = snapshot
            .error_counts
            .iter()
            .map(|(key, count)| ErrorCount {
                key: key.clone(),
                count: *count,
            })
            .collect();
        top_errors.sort_by(|a, b| b.count.cmp(&a.count));
        top_errors.truncate(top_error_count);

        let elapsed_ms = (now - snapshot.last_reset).num_milliseconds();
        let uptime_minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;

        Self {
            total_searches: snapshot.search_count,
            api_performance,
            cache_performance,
            top_errors,
            uptime_minutes,
        }
    }
}

fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn format_millis(millis: f64) -> String {
    if millis.is_finite() {
        format!("{}ms", millis.round() as i64)
    } else {
        "n/a".to_string()
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total searches: {}", self.total_searches)?;
        writeln!(f, "Uptime: {} min", self.uptime_minutes)?;

        if !self.api_performance.is_empty() {
            writeln!(f)?;
            writeln!(f, "Providers:")?;
            for (source, perf) in &self.api_performance {
                writeln!(
                    f,
                    "  {:<16} {:>7} success  {:>8} avg  {} calls",
                    source, perf.success_rate, perf.avg_response_time, perf.total_calls
                )?;
            }
        }

        if !self.cache_performance.is_empty() {
            writeln!(f)?;
            writeln!(f, "Caches:")?;
            for (cache_type, perf) in &self.cache_performance {
                writeln!(
                    f,
                    "  {:<16} {:>7} hits  {} requests",
                    cache_type, perf.hit_rate, perf.total_requests
                )?;
            }
        }

        if !self.top_errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top errors:")?;
            for error in &self.top_errors {
                writeln!(f, "  {:<24} {}", error.key, error.count)?;
            }
        }

        Ok(())
    }
}
