use dashboard_core::{
    metric_type::DEFAULT_FILE_SUFFIX,
    settings::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_TTL, MAX_TTL, REFERENCE_BUCKET},
    CacheSettings, DynObserver, MetricCatalog, MetricsCache, StalePolicy, StoreConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(with = "humantime_serde", default = "default_download_timeout")]
    pub download_timeout: Duration,
    #[serde(default)]
    pub stale_policy: StalePolicy,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_metric_types")]
    pub metric_types: BTreeMap<String, Vec<String>>,
}

/// TOML documents keep their settings under a `[cache]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub cache: DashboardConfig,
}

fn default_bucket() -> String {
    REFERENCE_BUCKET.to_string()
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_download_timeout() -> Duration {
    DEFAULT_DOWNLOAD_TIMEOUT
}

fn default_file_suffix() -> String {
    DEFAULT_FILE_SUFFIX.to_string()
}

fn default_metric_types() -> BTreeMap<String, Vec<String>> {
    MetricCatalog::reference().metric_types
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            ttl_seconds: default_ttl_seconds(),
            download_timeout: default_download_timeout(),
            stale_policy: StalePolicy::default(),
            file_suffix: default_file_suffix(),
            store: StoreConfig::default(),
            metric_types: default_metric_types(),
        }
    }
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn total_files(&self) -> usize {
        self.metric_types.values().map(Vec::len).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("Bucket name cannot be empty".to_string());
        }

        if self.ttl_seconds == 0 {
            return Err("ttl_seconds must be > 0".to_string());
        }

        if self.ttl_seconds > MAX_TTL.as_secs() {
            return Err(format!(
                "ttl_seconds must be at most {}",
                MAX_TTL.as_secs()
            ));
        }

        if self.download_timeout.is_zero() {
            return Err("download_timeout must be > 0".to_string());
        }

        if self.metric_types.is_empty() {
            return Err("At least one metric type must be configured".to_string());
        }

        for (metric_type, files) in &self.metric_types {
            if metric_type.trim().is_empty() {
                return Err("Metric type name cannot be empty".to_string());
            }

            if files.is_empty() {
                return Err(format!(
                    "Metric type '{}' must list at least one file",
                    metric_type
                ));
            }

            let mut seen = HashSet::new();
            for (i, file) in files.iter().enumerate() {
                if file.trim().is_empty() {
                    return Err(format!(
                        "File {} of metric type '{}' has an empty name",
                        i, metric_type
                    ));
                }

                if !self.file_suffix.is_empty() && !file.ends_with(&self.file_suffix) {
                    return Err(format!(
                        "File '{}' of metric type '{}' must end with '{}'",
                        file, metric_type, self.file_suffix
                    ));
                }

                if !seen.insert(file.as_str()) {
                    return Err(format!(
                        "File '{}' is listed twice for metric type '{}'",
                        file, metric_type
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn settings(&self) -> CacheSettings {
        CacheSettings::new(self.bucket.clone())
            .ttl(self.ttl())
            .download_timeout(self.download_timeout)
            .stale_policy(self.stale_policy)
    }

    pub fn catalog(&self) -> MetricCatalog {
        MetricCatalog::new(self.metric_types.clone()).with_suffix(self.file_suffix.clone())
    }

    /// Builds the store and the cache described by this configuration.
    pub fn build_cache(&self, observer: Option<DynObserver>) -> anyhow::Result<MetricsCache> {
        self.validate().map_err(|e| anyhow::anyhow!(e))?;

        let store = self.store.build()?;
        let mut builder = MetricsCache::builder(store)
            .settings(self.settings())
            .catalog(self.catalog());
        if let Some(observer) = observer {
            builder = builder.observer(observer);
        }
        Ok(builder.build()?)
    }
}

#[derive(Default)]
pub struct DashboardConfigBuilder {
    bucket: Option<String>,
    ttl_seconds: Option<u64>,
    download_timeout: Option<Duration>,
    stale_policy: Option<StalePolicy>,
    file_suffix: Option<String>,
    store: Option<StoreConfig>,
    metric_types: BTreeMap<String, Vec<String>>,
}

impl DashboardConfigBuilder {
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = Some(policy);
        self
    }

    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = Some(suffix.into());
        self
    }

    pub fn store(mut self, store: StoreConfig) -> Self {
        self.store = Some(store);
        self
    }

    pub fn metric_type<I, S>(mut self, name: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metric_types
            .insert(name.into(), files.into_iter().map(Into::into).collect());
        self
    }

    /// Metric types default to the reference table when none were added.
    pub fn build(self) -> DashboardConfig {
        let metric_types = if self.metric_types.is_empty() {
            default_metric_types()
        } else {
            self.metric_types
        };

        DashboardConfig {
            bucket: self.bucket.unwrap_or_else(default_bucket),
            ttl_seconds: self.ttl_seconds.unwrap_or_else(default_ttl_seconds),
            download_timeout: self.download_timeout.unwrap_or_else(default_download_timeout),
            stale_policy: self.stale_policy.unwrap_or_default(),
            file_suffix: self.file_suffix.unwrap_or_else(default_file_suffix),
            store: self.store.unwrap_or_default(),
            metric_types,
        }
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_deployment() {
        let config = DashboardConfig::default();
        assert_eq!(config.bucket, "recidiviz-staging-dashboard-data");
        assert_eq!(config.ttl(), Duration::from_secs(3600));
        assert_eq!(config.metric_types.len(), 3);
        assert_eq!(config.total_files(), 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DashboardConfig::builder()
            .bucket("test-bucket")
            .ttl_seconds(60)
            .store(StoreConfig::Memory)
            .metric_type("admission", ["a.json", "b.json"])
            .build();

        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.metric_types.len(), 1);
        assert_eq!(config.catalog().files_for("admission").unwrap().len(), 2);
        assert_eq!(config.settings().bucket, "test-bucket");
    }

    #[test]
    fn test_validation() {
        assert!(DashboardConfig::builder().bucket("").build().validate().is_err());
        assert!(DashboardConfig::builder().ttl_seconds(0).build().validate().is_err());
        assert!(DashboardConfig::builder()
            .ttl_seconds(u64::MAX)
            .build()
            .validate()
            .is_err());
        assert!(DashboardConfig::builder()
            .ttl_seconds(MAX_TTL.as_secs())
            .build()
            .validate()
            .is_ok());
        assert!(DashboardConfig::builder()
            .download_timeout(Duration::ZERO)
            .build()
            .validate()
            .is_err());

        let empty_files = DashboardConfig::builder()
            .metric_type("admission", Vec::<String>::new())
            .build();
        assert!(empty_files.validate().unwrap_err().contains("admission"));

        let wrong_suffix = DashboardConfig::builder()
            .metric_type("admission", ["a.csv"])
            .build();
        assert!(wrong_suffix.validate().is_err());

        let duplicate = DashboardConfig::builder()
            .metric_type("admission", ["a.json", "a.json"])
            .build();
        assert!(duplicate.validate().unwrap_err().contains("twice"));
    }

    #[tokio::test]
    async fn test_build_cache_from_config() {
        let config = DashboardConfig::builder()
            .store(StoreConfig::Memory)
            .metric_type("admission", ["a.json"])
            .build();

        let cache = config.build_cache(None).unwrap();
        assert_eq!(cache.metric_types(), vec!["admission".to_string()]);
        assert_eq!(cache.store_name(), "memory");
    }
}
