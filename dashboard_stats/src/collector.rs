use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashboard_core::{CacheError, CacheObserver};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEventKind {
    Hit,
    Miss,
    Coalesced,
    FetchSucceeded { elapsed: Duration },
    FetchFailed { elapsed: Duration, error_kind: String },
    StaleServed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEvent {
    pub metric_type: String,
    pub kind: CacheEventKind,
    pub timestamp: DateTime<Utc>,
}

/// Prometheus instruments for the cache, registered in a private registry.
#[derive(Clone)]
pub struct CacheMetrics {
    registry: Registry,
    requests: IntCounterVec,
    fetches: IntCounterVec,
    fetch_duration: HistogramVec,
}

impl CacheMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "dashboard_cache_requests_total",
                "Cache lookups by metric type and outcome",
            ),
            &["metric_type", "outcome"],
        )?;
        let fetches = IntCounterVec::new(
            Opts::new(
                "dashboard_cache_fetches_total",
                "Object store fetch-and-merge runs by metric type and result",
            ),
            &["metric_type", "result"],
        )?;
        let fetch_duration = HistogramVec::new(
            HistogramOpts::new(
                "dashboard_cache_fetch_duration_seconds",
                "Duration of fetch-and-merge runs",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["metric_type"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(fetches.clone()))?;
        registry.register(Box::new(fetch_duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            fetches,
            fetch_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn observe(&self, event: &CacheEvent) {
        let metric_type = event.metric_type.as_str();
        match &event.kind {
            CacheEventKind::Hit => self.request(metric_type, "hit"),
            CacheEventKind::Miss => self.request(metric_type, "miss"),
            CacheEventKind::Coalesced => self.request(metric_type, "coalesced"),
            CacheEventKind::StaleServed => self.request(metric_type, "stale"),
            CacheEventKind::FetchSucceeded { elapsed } => {
                self.fetch(metric_type, "ok", *elapsed);
            }
            CacheEventKind::FetchFailed {
                elapsed,
                error_kind,
            } => {
                self.fetch(metric_type, error_kind, *elapsed);
            }
        }
    }

    fn request(&self, metric_type: &str, outcome: &str) {
        self.requests
            .with_label_values(&[metric_type, outcome])
            .inc();
    }

    fn fetch(&self, metric_type: &str, result: &str, elapsed: Duration) {
        self.fetches.with_label_values(&[metric_type, result]).inc();
        self.fetch_duration
            .with_label_values(&[metric_type])
            .observe(elapsed.as_secs_f64());
    }
}

/// Events kept by [`CacheStatsCollector::new`] before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// Records cache events, both as a bounded log of recent events for reports
/// and as Prometheus instruments for scraping.
#[derive(Clone)]
pub struct CacheStatsCollector {
    events: Arc<RwLock<VecDeque<CacheEvent>>>,
    capacity: usize,
    metrics: CacheMetrics,
}

impl CacheStatsCollector {
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Keeps at most `capacity` recent events.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
            metrics: CacheMetrics::new()?,
        })
    }

    /// Updates the Prometheus instruments only. For long-running servers.
    pub fn metrics_only() -> Result<Self> {
        Self::with_capacity(0)
    }

    pub async fn record(&self, metric_type: &str, kind: CacheEventKind) {
        let event = CacheEvent {
            metric_type: metric_type.to_string(),
            kind,
            timestamp: Utc::now(),
        };
        self.metrics.observe(&event);

        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.write().await;
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub async fn get_events(&self) -> Vec<CacheEvent> {
        self.events.read().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

#[async_trait]
impl CacheObserver for CacheStatsCollector {
    async fn on_hit(&self, metric_type: &str) {
        self.record(metric_type, CacheEventKind::Hit).await;
    }

    async fn on_miss(&self, metric_type: &str) {
        self.record(metric_type, CacheEventKind::Miss).await;
    }

    async fn on_coalesced(&self, metric_type: &str) {
        self.record(metric_type, CacheEventKind::Coalesced).await;
    }

    async fn on_fetch_complete(
        &self,
        metric_type: &str,
        elapsed: Duration,
        outcome: std::result::Result<(), &CacheError>,
    ) {
        let kind = match outcome {
            Ok(()) => CacheEventKind::FetchSucceeded { elapsed },
            Err(err) => CacheEventKind::FetchFailed {
                elapsed,
                error_kind: err.kind().to_string(),
            },
        };
        self.record(metric_type, kind).await;
    }

    async fn on_stale_served(&self, metric_type: &str) {
        self.record(metric_type, CacheEventKind::StaleServed).await;
    }
}
