//! The in-memory telemetry snapshot.
//!
//! [`MetricsSnapshot`] is the single unit of state and of persistence. Its
//! JSON form uses camelCase keys and epoch-millisecond timestamps so that a
//! snapshot written by the browser extension loads unchanged.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hasher::{hash_query, query_length};
use crate::{Result, TelemetryError};

/// Call outcome counters for one provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Successful calls. Never exceeds `total`.
    pub success: u64,
    /// All calls.
    pub total: u64,
}

/// Hit counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups served from the cache. Never exceeds `total`.
    pub hits: u64,
    /// All lookups.
    pub total: u64,
}

/// Popularity record for one query digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStat {
    /// Digest of the query text.
    pub hash: String,
    /// Length of the original query in UTF-16 code units.
    pub length: usize,
    /// Number of searches with this digest.
    pub count: u64,
    /// Time of the most recent search with this digest.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_used: DateTime<Utc>,
}

/// Complete telemetry state for one measurement window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub search_count: u64,
    #[serde(default)]
    pub api_success_rates: BTreeMap<String, ProviderStats>,
    /// Latency samples in milliseconds, oldest first.
    #[serde(default)]
    pub average_response_times: BTreeMap<String, VecDeque<f64>>,
    /// Sorted descending by `count`.
    #[serde(default)]
    pub popular_queries: Vec<QueryStat>,
    /// Keyed by `"<provider>:<errorType>"`.
    #[serde(default)]
    pub error_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub cache_hit_rates: BTreeMap<String, CacheStats>,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub last_reset: DateTime<Utc>,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Builds the composite error bucket key.
pub fn error_key(source: &str, error_type: &str) -> String {
    format!("{}:{}", source, error_type)
}

impl MetricsSnapshot {
    /// Creates an all-zero snapshot whose window starts at `last_reset`.
    pub fn new(last_reset: DateTime<Utc>) -> Self {
        Self {
            search_count: 0,
            api_success_rates: BTreeMap::new(),
            average_response_times: BTreeMap::new(),
            popular_queries: Vec::new(),
            error_counts: BTreeMap::new(),
            cache_hit_rates: BTreeMap::new(),
            last_reset,
        }
    }

    /// Records one search: bumps the counter, the query digest's popularity,
    /// and the latency window of every listed source.
    pub(crate) fn apply_search(
        &mut self,
        query: &str,
        sources: &[&str],
        response_time: f64,
        now: DateTime<Utc>,
        max_popular_queries: usize,
        max_latency_samples: usize,
    ) {
        self.search_count += 1;

        let hash = hash_query(query);
        match self.popular_queries.iter_mut().find(|q| q.hash == hash) {
            Some(stat) => {
                stat.count += 1;
                stat.last_used = now;
            }
            None => self.popular_queries.push(QueryStat {
                hash,
                length: query_length(query),
                count: 1,
                last_used: now,
            }),
        }

        // sort_by is stable, so equal counts keep insertion order
        self.popular_queries.sort_by(|a, b| b.count.cmp(&a.count));
        self.popular_queries.truncate(max_popular_queries);

        for source in sources {
            self.push_latency(source, response_time, max_latency_samples);
        }
    }

    /// Records the outcome of one provider call.
    pub(crate) fn apply_api_call(
        &mut self,
        source: &str,
        success: bool,
        response_time: Option<f64>,
        max_latency_samples: usize,
    ) {
        let stats = self.api_success_rates.entry(source.to_string()).or_default();
        stats.total += 1;
        if success {
            stats.success += 1;
        }

        if let Some(response_time) = response_time {
            self.push_latency(source, response_time, max_latency_samples);
        }
    }

    /// Counts one error of `error_type` from `source`.
    pub(crate) fn apply_error(&mut self, source: &str, error_type: &str) {
        *self
            .error_counts
            .entry(error_key(source, error_type))
            .or_insert(0) += 1;
    }

    /// Records one cache lookup.
    pub(crate) fn apply_cache_hit(&mut self, cache_type: &str, hit: bool) {
        let stats = self.cache_hit_rates.entry(cache_type.to_string()).or_default();
        stats.total += 1;
        if hit {
            stats.hits += 1;
        }
    }

    /// Appends a latency sample, evicting the oldest beyond `max_samples`.
    fn push_latency(&mut self, source: &str, response_time: f64, max_samples: usize) {
        let samples = self
            .average_response_times
            .entry(source.to_string())
            .or_default();
        samples.push_back(response_time);
        while samples.len() > max_samples {
            samples.pop_front();
        }
    }

    /// Returns a copy of this snapshot with the top-level keys of `persisted`
    /// laid over it. Keys absent from `persisted` keep their current values.
    pub fn overlay(&self, persisted: Value) -> Result<Self> {
        let persisted = match persisted {
            Value::Object(map) => map,
            other => {
                return Err(TelemetryError::InvalidSnapshot(format!(
                    "expected an object, found {}",
                    value_kind(&other)
                )))
            }
        };

        let mut merged = serde_json::to_value(self)?;
        if let Value::Object(base) = &mut merged {
            base.extend(persisted);
        }
        Ok(serde_json::from_value(merged)?)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
