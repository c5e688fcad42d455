pub mod fetch;
pub mod list;
pub mod serve;
pub mod validate;
pub mod warm;

use anyhow::Result;
use clap::Args;
use dashboard_config::{parse_config_from_file, DashboardConfig};
use std::path::PathBuf;
use tracing::debug;

/// Where the cache configuration comes from, plus per-run overrides.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (YAML, TOML, or JSON); defaults to the reference catalog
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bucket metric files are read from
    #[arg(long, env = "DASHBOARD_BUCKET")]
    pub bucket: Option<String>,

    /// Override how long a fetched bundle stays fresh, in seconds
    #[arg(long, env = "DASHBOARD_TTL_SECONDS")]
    pub ttl_seconds: Option<u64>,
}

impl ConfigArgs {
    pub async fn load(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => parse_config_from_file(path).await?,
            None => {
                debug!("No configuration file given, using the reference catalog");
                DashboardConfig::default()
            }
        };

        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.clone();
        }
        if let Some(ttl_seconds) = self.ttl_seconds {
            config.ttl_seconds = ttl_seconds;
        }

        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }
}
