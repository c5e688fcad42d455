use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const REFERENCE_BUCKET: &str = "recidiviz-staging-dashboard-data";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest TTL an entry honours; larger values are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);

/// What a caller sees when refreshing an expired entry fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Surface the refresh error.
    #[default]
    Fail,
    /// Return the last good bundle even though it has expired.
    ServeStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub bucket: String,
    /// How long a fetched bundle stays fresh, clamped to [`MAX_TTL`].
    pub ttl: Duration,
    /// Limit on each file download. `Duration::ZERO` means unbounded.
    pub download_timeout: Duration,
    pub stale_policy: StalePolicy,
}

impl CacheSettings {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ttl: DEFAULT_TTL,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            stale_policy: StalePolicy::default(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the per-file download limit; `Duration::ZERO` disables it.
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::new(REFERENCE_BUCKET)
    }
}
