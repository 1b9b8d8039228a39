//! # search-telemetry
//!
//! On-device performance telemetry for a multi-provider search front end.
//!
//! The engine records searches, provider call outcomes, provider errors and
//! cache lookups, and derives from them:
//!
//! - Per-provider success rates and mean latency
//! - Cache efficiency
//! - Anonymized query popularity (digests only, never query text)
//! - A ranking of the currently most reliable providers
//! - A human-readable performance report
//!
//! State lives in memory and is persisted best-effort to a key-value store.
//!
//! ## Example
//!
//! ```rust,no_run
//! use search_telemetry::{store::MemoryStore, SourceCategory, Telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let telemetry = Telemetry::new(MemoryStore::new());
//!     telemetry.initialize().await;
//!     let _periodic = telemetry.start_periodic_save();
//!
//!     telemetry.record_api_call("unsplash", true, Some(180.0));
//!     telemetry.record_search("northern lights", &["unsplash"], 180.0, 24);
//!
//!     for ranked in telemetry.optimal_sources(SourceCategory::Images) {
//!         println!("{}: {:.0}%", ranked.source, ranked.success_rate * 100.0);
//!     }
//!     println!("{}", telemetry.performance_report());
//! }
//! ```

mod aggregator;
mod config;
mod error;
mod hasher;
mod persistence;
mod ranker;
mod report;
mod snapshot;
mod telemetry;

pub mod store;

pub use aggregator::{Aggregator, NO_DATA};
pub use config::TelemetryConfig;
pub use error::{Result, TelemetryError};
pub use hasher::{hash_query, query_length};
pub use persistence::PeriodicSave;
pub use ranker::{RankedSource, SourceCategory, SourceRanker};
pub use report::{ApiPerformance, CachePerformance, ErrorCount, PerformanceReport};
pub use snapshot::{error_key, CacheStats, MetricsSnapshot, ProviderStats, QueryStat};
pub use telemetry::Telemetry;
