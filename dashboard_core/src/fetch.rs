use crate::{
    bundle::MetricBundle,
    error::{CacheError, Result, StoreError},
    metric_type::MetricCatalog,
    stores::ObjectStore,
};
use futures::future::try_join_all;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Downloads every file of `metric_type` concurrently and merges the decoded
/// contents into one bundle.
///
/// The first failing download or decode fails the whole call. Downloads still
/// in flight at that point are dropped. A zero `download_timeout` leaves each
/// download unbounded.
pub async fn fetch_and_merge(
    store: &dyn ObjectStore,
    catalog: &MetricCatalog,
    bucket: &str,
    metric_type: &str,
    download_timeout: Duration,
) -> Result<MetricBundle> {
    let files = catalog.files_for(metric_type)?;

    info!(
        "Fetching {} metrics ({} files) from {} bucket '{}'",
        metric_type,
        files.len(),
        store.name(),
        bucket
    );

    let downloads = files.iter().map(|file_name| async move {
        let contents = download_with_timeout(store, bucket, file_name, download_timeout).await?;
        let value = decode_contents(file_name, contents)?;
        Ok::<_, CacheError>((catalog.file_key(file_name).to_string(), value))
    });

    let bundle: MetricBundle = try_join_all(downloads).await?.into_iter().collect();

    info!("Fetched all {} metrics", metric_type);
    Ok(bundle)
}

async fn download_with_timeout(
    store: &dyn ObjectStore,
    bucket: &str,
    file_name: &str,
    download_timeout: Duration,
) -> Result<Vec<u8>> {
    let download = store.download(bucket, file_name);
    let result = if download_timeout.is_zero() {
        download.await
    } else {
        tokio::time::timeout(download_timeout, download)
            .await
            .unwrap_or(Err(StoreError::Timeout(download_timeout)))
    };

    result.map_err(|source| CacheError::Fetch {
        file: file_name.to_string(),
        source,
    })
}

/// Decodes one downloaded file. Empty content decodes to `null`.
pub fn decode_contents(file_name: &str, contents: Vec<u8>) -> Result<Value> {
    let text = String::from_utf8(contents).map_err(|e| CacheError::decode(file_name, e))?;
    if text.is_empty() {
        debug!("{} is empty, storing null", file_name);
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| CacheError::decode(file_name, e))
}
