use dashboard_core::{
    async_trait, CacheError, CacheObserver, CacheSettings, InMemoryStore, MetricCatalog,
    MetricsCache, StoreError, ADMISSION,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const BUCKET: &str = "dashboard-data";
const TTL: Duration = Duration::from_secs(3600);

const FILE_1: &str = "admissions_by_type_60_days.json";
const FILE_2: &str = "admissions_by_type_by_month.json";
const FILE_3: &str = "admissions_versus_releases_by_month.json";

fn admission_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_object(BUCKET, FILE_1, r#"{"a":1}"#)
        .with_object(BUCKET, FILE_2, "[]")
        .with_object(BUCKET, FILE_3, "")
}

fn cache_over(store: Arc<InMemoryStore>) -> MetricsCache {
    MetricsCache::new(
        store,
        CacheSettings::new(BUCKET).ttl(TTL),
        MetricCatalog::reference(),
    )
    .unwrap()
}

#[derive(Default)]
struct CountingObserver {
    hits: AtomicUsize,
    misses: AtomicUsize,
    coalesced: AtomicUsize,
    fetches: AtomicUsize,
}

#[async_trait]
impl CacheObserver for CountingObserver {
    async fn on_hit(&self, _metric_type: &str) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_miss(&self, _metric_type: &str) {
        self.misses.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_coalesced(&self, _metric_type: &str) {
        self.coalesced.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_fetch_complete(
        &self,
        _metric_type: &str,
        _elapsed: Duration,
        _outcome: Result<(), &CacheError>,
    ) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn admission_bundle_merges_all_files() {
    let cache = cache_over(Arc::new(admission_store()));

    let bundle = assert_ok!(cache.fetch_metrics(ADMISSION).await);

    assert_eq!(
        serde_json::to_value(&bundle).unwrap(),
        json!({
            "admissions_by_type_60_days": {"a": 1},
            "admissions_by_type_by_month": [],
            "admissions_versus_releases_by_month": null,
        })
    );
}

#[tokio::test]
async fn second_call_within_ttl_does_not_download() {
    let store = Arc::new(admission_store());
    let observer = Arc::new(CountingObserver::default());
    let cache = MetricsCache::builder(store.clone())
        .settings(CacheSettings::new(BUCKET).ttl(TTL))
        .observer(observer.clone())
        .build()
        .unwrap();

    let first = assert_ok!(cache.fetch_admission_metrics().await);
    let second = assert_ok!(cache.fetch_admission_metrics().await);

    assert!(first.ptr_eq(&second));
    assert_eq!(store.download_count(), 3);
    for file in [FILE_1, FILE_2, FILE_3] {
        assert_eq!(store.downloads_of(BUCKET, file).await, 1);
    }
    assert_eq!(observer.misses.load(Ordering::SeqCst), 1);
    assert_eq!(observer.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_refetched_once() {
    let store = Arc::new(admission_store());
    let cache = cache_over(store.clone());

    assert_ok!(cache.fetch_metrics(ADMISSION).await);

    // Reads close to expiry do not extend the TTL.
    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(store.download_count(), 3);

    store.put(BUCKET, FILE_1, r#"{"a":2}"#).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let refreshed = assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(refreshed.get("admissions_by_type_60_days"), Some(&json!({"a": 2})));
    assert_eq!(store.download_count(), 6);

    assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(store.download_count(), 6);
}

#[tokio::test]
async fn failed_download_caches_nothing() {
    let store = Arc::new(admission_store().with_failure(
        BUCKET,
        FILE_2,
        StoreError::NotFound(FILE_2.to_string()),
    ));
    let cache = cache_over(store.clone());

    let err = assert_err!(cache.fetch_metrics(ADMISSION).await);
    assert!(matches!(err, CacheError::Fetch { ref file, .. } if file == FILE_2));

    let status = cache.status().await;
    let admission = status.iter().find(|s| s.metric_type == ADMISSION).unwrap();
    assert!(!admission.cached);
    assert!(!admission.fetch_in_flight);

    // Nothing was stored, so the next call retries the whole fetch.
    store.clear_failure(BUCKET, FILE_2).await;
    let before = store.download_count();
    let bundle = assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(bundle.len(), 3);
    assert_eq!(store.download_count(), before + 3);
}

#[tokio::test]
async fn unknown_metric_type_is_a_configuration_error() {
    let store = Arc::new(admission_store());
    let cache = cache_over(store.clone());

    let err = assert_err!(cache.fetch_metrics("unknown_type").await);
    assert!(matches!(err, CacheError::Configuration(ref t) if t == "unknown_type"));
    assert_eq!(store.download_count(), 0);
}

#[tokio::test]
async fn concurrent_misses_share_one_fetch() {
    let store = Arc::new(admission_store().with_latency(Duration::from_millis(50)));
    let observer = Arc::new(CountingObserver::default());
    let cache = MetricsCache::builder(store.clone())
        .settings(CacheSettings::new(BUCKET).ttl(TTL))
        .observer(observer.clone())
        .build()
        .unwrap();

    let callers = (0..16).map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.fetch_metrics(ADMISSION).await })
    });
    let bundles: Vec<_> = futures::future::join_all(callers)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(store.download_count(), 3);
    assert_eq!(observer.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(
        observer.misses.load(Ordering::SeqCst)
            + observer.coalesced.load(Ordering::SeqCst)
            + observer.hits.load(Ordering::SeqCst),
        16
    );
    assert!(bundles.iter().all(|b| b.ptr_eq(&bundles[0])));
}

#[tokio::test]
async fn concurrent_waiters_all_see_the_failure() {
    let store = Arc::new(
        admission_store()
            .with_latency(Duration::from_millis(50))
            .with_failure(BUCKET, FILE_3, StoreError::PermissionDenied(FILE_3.into())),
    );
    let cache = cache_over(store.clone());

    let results = futures::future::join_all((0..8).map(|_| cache.fetch_metrics(ADMISSION))).await;

    assert!(results
        .iter()
        .all(|r| matches!(r, Err(CacheError::Fetch { .. }))));
    assert_eq!(store.download_count(), 3);
}

#[tokio::test]
async fn types_are_cached_independently() {
    let store = Arc::new(
        admission_store()
            .with_object(BUCKET, "revocations_by_month.json", "[1]")
            .with_object(BUCKET, "revocations_by_race_60_days.json", "[2]")
            .with_object(BUCKET, "revocations_by_supervision_type_by_month.json", "[3]")
            .with_object(BUCKET, "revocations_by_violation_type_by_month.json", "[4]"),
    );
    let cache = cache_over(store.clone());

    let warmed = cache.warm_all().await;
    assert_eq!(warmed.len(), 3);

    let outcomes: std::collections::HashMap<_, _> = warmed
        .into_iter()
        .map(|(metric_type, result)| (metric_type, result.is_ok()))
        .collect();
    assert_eq!(outcomes["admission"], true);
    assert_eq!(outcomes["revocation"], true);
    assert_eq!(outcomes["reincarceration"], false);

    let revocations = assert_ok!(cache.fetch_revocation_metrics().await);
    assert_eq!(revocations.get("revocations_by_month"), Some(&json!([1])));
    assert_eq!(store.downloads_of(BUCKET, "revocations_by_month.json").await, 1);
    assert_eq!(store.downloads_of(BUCKET, FILE_1).await, 1);
}

#[tokio::test]
async fn huge_ttl_still_caches() {
    let store = Arc::new(admission_store());
    let cache = MetricsCache::new(
        store.clone(),
        CacheSettings::new(BUCKET).ttl(Duration::from_secs(u64::MAX)),
        MetricCatalog::reference(),
    )
    .unwrap();

    assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(store.download_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn aborted_caller_does_not_cancel_the_fetch() {
    let store = Arc::new(admission_store().with_latency(Duration::from_millis(50)));
    let cache = cache_over(store.clone());

    let first = tokio::spawn({
        let cache = cache.clone();
        async move { cache.fetch_metrics(ADMISSION).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());

    let bundle = assert_ok!(cache.fetch_metrics(ADMISSION).await);
    assert_eq!(bundle.len(), 3);
    assert_eq!(store.download_count(), 3);
}
