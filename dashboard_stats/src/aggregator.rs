use crate::collector::{CacheEvent, CacheEventKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub total_requests: usize,
    pub hits: usize,
    pub misses: usize,
    pub coalesced: usize,
    pub stale_served: usize,
    pub hit_ratio: f64,
    pub fetches: usize,
    pub failed_fetches: usize,
    pub failures_by_kind: BTreeMap<String, usize>,
    pub fetch_latency_p50: Duration,
    pub fetch_latency_p95: Duration,
    pub fetch_latency_p99: Duration,
    pub average_fetch_latency: Duration,
    pub min_fetch_latency: Duration,
    pub max_fetch_latency: Duration,
}

pub struct StatsAggregator;

impl StatsAggregator {
    pub fn aggregate(events: &[CacheEvent]) -> CacheSummary {
        let mut summary = CacheSummary::default();
        let mut latencies: Vec<Duration> = Vec::new();

        for event in events {
            match &event.kind {
                CacheEventKind::Hit => summary.hits += 1,
                CacheEventKind::Miss => summary.misses += 1,
                CacheEventKind::Coalesced => summary.coalesced += 1,
                CacheEventKind::StaleServed => summary.stale_served += 1,
                CacheEventKind::FetchSucceeded { elapsed } => {
                    summary.fetches += 1;
                    latencies.push(*elapsed);
                }
                CacheEventKind::FetchFailed {
                    elapsed,
                    error_kind,
                } => {
                    summary.fetches += 1;
                    summary.failed_fetches += 1;
                    *summary
                        .failures_by_kind
                        .entry(error_kind.clone())
                        .or_insert(0) += 1;
                    latencies.push(*elapsed);
                }
            }
        }

        // Stale serves follow a miss or coalesced wait and are not requests of their own.
        summary.total_requests = summary.hits + summary.misses + summary.coalesced;
        summary.hit_ratio = if summary.total_requests > 0 {
            summary.hits as f64 / summary.total_requests as f64
        } else {
            0.0
        };

        latencies.sort();
        if let (Some(min), Some(max)) = (latencies.first(), latencies.last()) {
            summary.min_fetch_latency = *min;
            summary.max_fetch_latency = *max;
            summary.fetch_latency_p50 = Self::percentile(&latencies, 0.50);
            summary.fetch_latency_p95 = Self::percentile(&latencies, 0.95);
            summary.fetch_latency_p99 = Self::percentile(&latencies, 0.99);
            summary.average_fetch_latency = Self::average(&latencies);
        }

        summary
    }

    /// Splits events by metric type and aggregates each group.
    pub fn aggregate_by_type(events: &[CacheEvent]) -> BTreeMap<String, CacheSummary> {
        let mut grouped: BTreeMap<String, Vec<CacheEvent>> = BTreeMap::new();
        for event in events {
            grouped
                .entry(event.metric_type.clone())
                .or_default()
                .push(event.clone());
        }

        grouped
            .into_iter()
            .map(|(metric_type, events)| (metric_type, Self::aggregate(&events)))
            .collect()
    }

    fn percentile(sorted: &[Duration], percentile: f64) -> Duration {
        if sorted.is_empty() {
            return Duration::ZERO;
        }

        let index = ((sorted.len() as f64) * percentile) as usize;
        let index = index.min(sorted.len() - 1);
        sorted[index]
    }

    fn average(durations: &[Duration]) -> Duration {
        if durations.is_empty() {
            return Duration::ZERO;
        }

        let sum: Duration = durations.iter().sum();
        sum / durations.len() as u32
    }
}
