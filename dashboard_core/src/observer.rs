use crate::error::CacheError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Receives cache events. All methods default to no-ops.
#[async_trait]
pub trait CacheObserver: Send + Sync {
    async fn on_hit(&self, _metric_type: &str) {}

    async fn on_miss(&self, _metric_type: &str) {}

    /// A request joined a fetch started by another request.
    async fn on_coalesced(&self, _metric_type: &str) {}

    async fn on_fetch_complete(
        &self,
        _metric_type: &str,
        _elapsed: Duration,
        _outcome: Result<(), &CacheError>,
    ) {
    }

    async fn on_stale_served(&self, _metric_type: &str) {}
}

pub type DynObserver = Arc<dyn CacheObserver>;

pub struct NoopObserver;

#[async_trait]
impl CacheObserver for NoopObserver {}
