//! The telemetry engine: recording and query entry points.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::store::KeyValueStore;
use crate::{
    Aggregator, MetricsSnapshot, PerformanceReport, RankedSource, SourceCategory, SourceRanker,
    TelemetryConfig,
};

/// Shared handle to one telemetry engine.
///
/// Cloning is cheap and every clone observes the same snapshot. Recording
/// and querying are synchronous and never fail; persistence goes through
/// the async [`Telemetry::initialize`], [`Telemetry::save`] and
/// [`Telemetry::reset`].
#[derive(Clone)]
pub struct Telemetry {
    pub(crate) state: Arc<RwLock<MetricsSnapshot>>,
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) config: Arc<TelemetryConfig>,
}

impl Telemetry {
    /// Creates an engine with default configuration backed by `store`.
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        Self::with_config(store, TelemetryConfig::default())
    }

    /// Creates an engine with the given configuration backed by `store`.
    pub fn with_config<S: KeyValueStore + 'static>(store: S, config: TelemetryConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Creates an engine over a store that is also used elsewhere.
    pub fn from_shared(store: Arc<dyn KeyValueStore>, config: TelemetryConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(MetricsSnapshot::new(Utc::now()))),
            store,
            config: Arc::new(config),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.read().clone()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, MetricsSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, MetricsSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a completed search across `sources`.
    ///
    /// Only a digest and the length of `query` are kept. The result count
    /// is accepted for callers that report it but is not tracked.
    pub fn record_search(
        &self,
        query: &str,
        sources: &[&str],
        response_time: f64,
        _result_count: usize,
    ) {
        self.write().apply_search(
            query,
            sources,
            response_time,
            Utc::now(),
            self.config.max_popular_queries,
            self.config.max_latency_samples,
        );
    }

    /// Records one provider call and, when known, its latency.
    pub fn record_api_call(&self, source: &str, success: bool, response_time: Option<f64>) {
        self.write().apply_api_call(
            source,
            success,
            response_time,
            self.config.max_latency_samples,
        );
    }

    /// Counts one error of `error_type` raised by `source`.
    pub fn record_error(&self, source: &str, error_type: &str) {
        self.write().apply_error(source, error_type);
    }

    /// Records one cache lookup.
    pub fn record_cache_hit(&self, cache_type: &str, hit: bool) {
        self.write().apply_cache_hit(cache_type, hit);
    }

    /// Fraction of successful calls to `source`, `0.0` without data.
    pub fn success_rate(&self, source: &str) -> f64 {
        Aggregator::new(&self.read()).success_rate(source)
    }

    /// Mean latency of `source` in milliseconds, or [`crate::NO_DATA`].
    pub fn average_response_time(&self, source: &str) -> f64 {
        Aggregator::new(&self.read()).average_response_time(source)
    }

    /// Hit rate of `cache_type`, `0.0` without data.
    pub fn cache_efficiency(&self, cache_type: &str) -> f64 {
        Aggregator::new(&self.read()).cache_efficiency(cache_type)
    }

    /// Reliable providers, best first. `category` does not filter.
    pub fn optimal_sources(&self, category: SourceCategory) -> Vec<RankedSource> {
        SourceRanker::from_config(&self.config).rank(&self.read(), category)
    }

    /// Summary of all derived statistics as of now.
    pub fn performance_report(&self) -> PerformanceReport {
        PerformanceReport::from_snapshot(&self.read(), self.config.top_error_count, Utc::now())
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("config", &self.config)
            .field("search_count", &self.read().search_count)
            .finish_non_exhaustive()
    }
}
