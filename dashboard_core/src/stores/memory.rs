use crate::{error::StoreError, stores::ObjectStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

type ObjectKey = (String, String);

/// Object store held entirely in memory.
///
/// Supports injected failures and latency and counts every download, which
/// makes it the store of choice for exercising the cache.
#[derive(Default)]
pub struct InMemoryStore {
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
    failures: RwLock<HashMap<ObjectKey, StoreError>>,
    latency: Duration,
    downloads: AtomicU64,
    downloads_by_file: RwLock<HashMap<ObjectKey, u64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects
            .get_mut()
            .insert((bucket.into(), file_name.into()), contents.into());
        self
    }

    pub fn with_failure(
        mut self,
        bucket: impl Into<String>,
        file_name: impl Into<String>,
        error: StoreError,
    ) -> Self {
        self.failures
            .get_mut()
            .insert((bucket.into(), file_name.into()), error);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn put(&self, bucket: &str, file_name: &str, contents: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert(key(bucket, file_name), contents.into());
    }

    pub async fn fail(&self, bucket: &str, file_name: &str, error: StoreError) {
        self.failures
            .write()
            .await
            .insert(key(bucket, file_name), error);
    }

    pub async fn clear_failure(&self, bucket: &str, file_name: &str) {
        self.failures.write().await.remove(&key(bucket, file_name));
    }

    /// Total downloads attempted, failed ones included.
    pub fn download_count(&self) -> u64 {
        self.downloads.load(Ordering::SeqCst)
    }

    pub async fn downloads_of(&self, bucket: &str, file_name: &str) -> u64 {
        self.downloads_by_file
            .read()
            .await
            .get(&key(bucket, file_name))
            .copied()
            .unwrap_or(0)
    }
}

fn key(bucket: &str, file_name: &str) -> ObjectKey {
    (bucket.to_string(), file_name.to_string())
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Vec<u8>, StoreError> {
        let object_key = key(bucket, file_name);
        self.downloads.fetch_add(1, Ordering::SeqCst);
        *self
            .downloads_by_file
            .write()
            .await
            .entry(object_key.clone())
            .or_insert(0) += 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = self.failures.read().await.get(&object_key) {
            debug!("Injected failure for {}/{}: {}", bucket, file_name, error);
            return Err(error.clone());
        }

        self.objects
            .read()
            .await
            .get(&object_key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", bucket, file_name)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
