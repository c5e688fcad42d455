use crate::bundle::MetricBundle;
use crate::settings::MAX_TTL;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// A bundle installed in the cache together with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub bundle: MetricBundle,
    pub fetch_id: String,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    expires_at: Instant,
}

impl CacheEntry {
    pub fn new(bundle: MetricBundle, fetch_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            bundle,
            fetch_id: fetch_id.into(),
            fetched_at: chrono::Utc::now(),
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        }
    }

    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn age(&self) -> chrono::Duration {
        chrono::Utc::now() - self.fetched_at
    }
}

/// Point-in-time view of one metric type's cache slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryStatus {
    pub metric_type: String,
    pub cached: bool,
    pub fresh: bool,
    pub fetch_in_flight: bool,
    pub fetch_id: Option<String>,
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
    pub expires_in_seconds: Option<u64>,
    pub file_count: Option<usize>,
}

impl EntryStatus {
    pub fn empty(metric_type: impl Into<String>, fetch_in_flight: bool) -> Self {
        Self {
            metric_type: metric_type.into(),
            cached: false,
            fresh: false,
            fetch_in_flight,
            fetch_id: None,
            fetched_at: None,
            expires_in_seconds: None,
            file_count: None,
        }
    }

    pub fn from_entry(
        metric_type: impl Into<String>,
        entry: &CacheEntry,
        fetch_in_flight: bool,
    ) -> Self {
        Self {
            metric_type: metric_type.into(),
            cached: true,
            fresh: entry.is_fresh(),
            fetch_in_flight,
            fetch_id: Some(entry.fetch_id.clone()),
            fetched_at: Some(entry.fetched_at),
            expires_in_seconds: Some(entry.expires_in().as_secs()),
            file_count: Some(entry.bundle.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new(MetricBundle::default(), "f1", Duration::from_secs(10));
        assert!(entry.is_fresh());
        assert_eq!(entry.expires_in(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(entry.is_fresh());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!entry.is_fresh());
        assert_eq!(entry.expires_in(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_clamped() {
        let entry = CacheEntry::new(
            MetricBundle::default(),
            "f3",
            Duration::from_secs(u64::MAX),
        );
        assert!(entry.is_fresh());
        assert_eq!(entry.expires_in(), MAX_TTL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_from_entry() {
        let entry = CacheEntry::new(MetricBundle::default(), "f2", Duration::from_secs(60));
        let status = EntryStatus::from_entry("admission", &entry, false);
        assert!(status.cached);
        assert!(status.fresh);
        assert_eq!(status.fetch_id.as_deref(), Some("f2"));
        assert_eq!(status.expires_in_seconds, Some(60));
        assert_eq!(status.file_count, Some(0));

        let empty = EntryStatus::empty("revocation", true);
        assert!(!empty.cached);
        assert!(empty.fetch_in_flight);
    }
}
