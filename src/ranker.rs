//! Provider ranking by reliability and latency.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Aggregator, MetricsSnapshot, TelemetryConfig, TelemetryError};

/// Content categories a caller may rank providers for.
///
/// Ranking currently ignores the category: every tracked provider is
/// considered regardless of what it serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    #[default]
    General,
    Web,
    Images,
    News,
    Videos,
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceCategory::General => "general",
            SourceCategory::Web => "web",
            SourceCategory::Images => "images",
            SourceCategory::News => "news",
            SourceCategory::Videos => "videos",
        };
        f.write_str(name)
    }
}

impl FromStr for SourceCategory {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(SourceCategory::General),
            "web" => Ok(SourceCategory::Web),
            "images" | "image" => Ok(SourceCategory::Images),
            "news" => Ok(SourceCategory::News),
            "videos" | "video" => Ok(SourceCategory::Videos),
            _ => Err(TelemetryError::InvalidCategory(s.to_string())),
        }
    }
}

/// A provider that passed the reliability filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSource {
    pub source: String,
    pub success_rate: f64,
    /// Mean latency in milliseconds; infinite when no samples exist.
    pub avg_response_time: f64,
}

/// Filters and orders providers by success rate, then latency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRanker {
    min_success_rate: f64,
    tolerance: f64,
}

impl Default for SourceRanker {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

impl SourceRanker {
    /// Creates a ranker with explicit thresholds.
    pub fn new(min_success_rate: f64, tolerance: f64) -> Self {
        Self {
            min_success_rate,
            tolerance,
        }
    }

    /// Creates a ranker from the engine configuration.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.min_success_rate, config.success_rate_tolerance)
    }

    /// Ranks every provider with call data in `snapshot`.
    ///
    /// Providers at or below the minimum success rate are dropped. Two
    /// providers whose success rates differ by more than the tolerance are
    /// ordered by success rate; otherwise the faster one comes first.
    pub fn rank(&self, snapshot: &MetricsSnapshot, category: SourceCategory) -> Vec<RankedSource> {
        let aggregator = Aggregator::new(snapshot);

        let candidates: Vec<RankedSource> = snapshot
            .api_success_rates
            .keys()
            .map(|source| RankedSource {
                source: source.clone(),
                success_rate: aggregator.success_rate(source),
                avg_response_time: aggregator.average_response_time(source),
            })
            .filter(|ranked| ranked.success_rate > self.min_success_rate)
            .collect();

        let ranked = self.sort(candidates);
        debug!(%category, ranked = ranked.len(), "ranked sources");
        ranked
    }

    fn compare(&self, a: &RankedSource, b: &RankedSource) -> Ordering {
        if (a.success_rate - b.success_rate).abs() > self.tolerance {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(Ordering::Equal)
        } else {
            a.avg_response_time
                .partial_cmp(&b.avg_response_time)
                .unwrap_or(Ordering::Equal)
        }
    }

    // The tolerance band makes `compare` non-transitive, which std's sort may
    // reject with a panic. A stable insertion sort accepts any comparator.
    fn sort(&self, mut items: Vec<RankedSource>) -> Vec<RankedSource> {
        for i in 1..items.len() {
            let mut j = i;
            while j > 0 && self.compare(&items[j - 1], &items[j]) == Ordering::Greater {
                items.swap(j - 1, j);
                j -= 1;
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ProviderStats;

    fn snapshot_with(providers: &[(&str, u64, u64, Vec<f64>)]) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        for (name, success, total, samples) in providers {
            snapshot.api_success_rates.insert(
                name.to_string(),
                ProviderStats {
                    success: *success,
                    total: *total,
                },
            );
            if !samples.is_empty() {
                snapshot
                    .average_response_times
                    .insert(name.to_string(), samples.iter().copied().collect());
            }
        }
        snapshot
    }

    fn names(ranked: &[RankedSource]) -> Vec<&str> {
        ranked.iter().map(|r| r.source.as_str()).collect()
    }

    #[test]
    fn test_rank_empty() {
        let ranker = SourceRanker::default();
        let ranked = ranker.rank(&MetricsSnapshot::default(), SourceCategory::General);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_filters_low_success() {
        let snapshot = snapshot_with(&[
            ("half", 1, 2, vec![100.0]),
            ("low", 1, 4, vec![50.0]),
            ("good", 9, 10, vec![200.0]),
        ]);
        let ranked = SourceRanker::default().rank(&snapshot, SourceCategory::General);
        assert_eq!(names(&ranked), vec!["good"]);
        assert!(ranked.iter().all(|r| r.success_rate > 0.5));
    }

    #[test]
    fn test_rank_within_tolerance_prefers_faster() {
        let snapshot = snapshot_with(&[("a", 90, 100, vec![500.0]), ("b", 82, 100, vec![100.0])]);
        let ranked = SourceRanker::default().rank(&snapshot, SourceCategory::Images);
        assert_eq!(names(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_rank_outside_tolerance_prefers_reliable() {
        let snapshot = snapshot_with(&[("fast", 6, 10, vec![50.0]), ("steady", 10, 10, vec![900.0])]);
        let ranked = SourceRanker::default().rank(&snapshot, SourceCategory::Web);
        assert_eq!(names(&ranked), vec!["steady", "fast"]);
    }

    #[test]
    fn test_rank_no_latency_sorts_last_within_band() {
        let snapshot = snapshot_with(&[("silent", 10, 10, vec![]), ("timed", 10, 10, vec![300.0])]);
        let ranked = SourceRanker::default().rank(&snapshot, SourceCategory::General);
        assert_eq!(names(&ranked), vec!["timed", "silent"]);
        assert!(ranked[1].avg_response_time.is_infinite());
    }

    #[test]
    fn test_rank_category_is_ignored() {
        let snapshot = snapshot_with(&[("a", 9, 10, vec![100.0]), ("b", 8, 10, vec![50.0])]);
        let ranker = SourceRanker::default();
        let general = ranker.rank(&snapshot, SourceCategory::General);
        let news = ranker.rank(&snapshot, SourceCategory::News);
        assert_eq!(general, news);
    }

    #[test]
    fn test_rank_non_transitive_does_not_panic() {
        // a~b and b~c are within tolerance, a vs c is not
        let snapshot = snapshot_with(&[
            ("a", 100, 100, vec![300.0]),
            ("b", 92, 100, vec![200.0]),
            ("c", 84, 100, vec![100.0]),
            ("d", 76, 100, vec![50.0]),
            ("e", 68, 100, vec![25.0]),
        ]);
        let ranked = SourceRanker::default().rank(&snapshot, SourceCategory::General);
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn test_ranker_custom_thresholds() {
        let snapshot = snapshot_with(&[("a", 3, 10, vec![100.0]), ("b", 4, 10, vec![500.0])]);
        let ranker = SourceRanker::new(0.2, 0.05);
        let ranked = ranker.rank(&snapshot, SourceCategory::General);
        assert_eq!(names(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_ranker_from_config() {
        let config = TelemetryConfig::new()
            .with_min_success_rate(0.7)
            .with_success_rate_tolerance(0.2);
        assert_eq!(SourceRanker::from_config(&config), SourceRanker::new(0.7, 0.2));
    }

    #[test]
    fn test_source_category_default() {
        let default: SourceCategory = Default::default();
        assert_eq!(default, SourceCategory::General);
    }

    #[test]
    fn test_source_category_from_str() {
        assert_eq!("images".parse::<SourceCategory>().unwrap(), SourceCategory::Images);
        assert_eq!("Image".parse::<SourceCategory>().unwrap(), SourceCategory::Images);
        assert_eq!("NEWS".parse::<SourceCategory>().unwrap(), SourceCategory::News);
        assert!(matches!(
            "maps".parse::<SourceCategory>(),
            Err(TelemetryError::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_source_category_display() {
        assert_eq!(SourceCategory::Videos.to_string(), "videos");
        assert_eq!(SourceCategory::Web.to_string(), "web");
    }

    #[test]
    fn test_source_category_serialization() {
        let json = serde_json::to_string(&SourceCategory::Images).unwrap();
        assert_eq!(json, "\"images\"");
        let category: SourceCategory = serde_json::from_str("\"news\"").unwrap();
        assert_eq!(category, SourceCategory::News);
    }

    #[test]
    fn test_ranked_source_serialization() {
        let ranked = RankedSource {
            source: "google".to_string(),
            success_rate: 0.9,
            avg_response_time: 120.0,
        };
        let json = serde_json::to_string(&ranked).unwrap();
        assert!(json.contains("\"successRate\":0.9"));
        assert!(json.contains("\"avgResponseTime\":120.0"));
    }
}
