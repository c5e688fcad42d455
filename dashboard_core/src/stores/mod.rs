pub mod http;
pub mod local;
pub mod memory;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub use http::{HttpStore, DEFAULT_GCS_ENDPOINT};
pub use local::LocalFsStore;
pub use memory::InMemoryStore;

/// Downloads named blobs from named buckets.
///
/// Implementations report failures through [`StoreError`] and never retry on
/// behalf of the cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Vec<u8>, StoreError>;

    /// Short backend label for logs.
    fn name(&self) -> &str;
}

pub type DynObjectStore = Arc<dyn ObjectStore>;

/// Serializable description of an object store backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Empty in-memory store, mostly useful for tests and demos.
    Memory,

    /// Objects under `<root>/<bucket>/<file>` on the local filesystem.
    Local { root: PathBuf },

    /// Objects at `<endpoint>/<bucket>/<file>` over HTTP(S).
    Http {
        #[serde(default = "default_endpoint")]
        endpoint: String,
        #[serde(default)]
        bearer_token: Option<String>,
    },
}

fn default_endpoint() -> String {
    DEFAULT_GCS_ENDPOINT.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Http {
            endpoint: default_endpoint(),
            bearer_token: None,
        }
    }
}

impl StoreConfig {
    pub fn build(&self) -> Result<DynObjectStore, StoreError> {
        let store: DynObjectStore = match self {
            StoreConfig::Memory => Arc::new(InMemoryStore::new()),
            StoreConfig::Local { root } => Arc::new(LocalFsStore::new(root.clone())),
            StoreConfig::Http {
                endpoint,
                bearer_token,
            } => Arc::new(
                HttpStore::new(endpoint.clone())?.with_bearer_token(bearer_token.clone()),
            ),
        };
        Ok(store)
    }

    pub fn description(&self) -> String {
        match self {
            StoreConfig::Memory => "in-memory".to_string(),
            StoreConfig::Local { root } => format!("local {}", root.display()),
            StoreConfig::Http { endpoint, .. } => format!("http {}", endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_tagging() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"kind": "local", "root": "/srv/metrics"}"#).unwrap();
        assert_eq!(
            config,
            StoreConfig::Local {
                root: PathBuf::from("/srv/metrics")
            }
        );

        let config: StoreConfig = serde_json::from_str(r#"{"kind": "http"}"#).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(
            config.description(),
            "http https://storage.googleapis.com"
        );
    }

    #[test]
    fn test_build_backends() {
        assert_eq!(StoreConfig::Memory.build().unwrap().name(), "memory");
        let local = StoreConfig::Local {
            root: PathBuf::from("."),
        };
        assert_eq!(local.build().unwrap().name(), "local");
        assert_eq!(StoreConfig::default().build().unwrap().name(), "http");
    }
}
