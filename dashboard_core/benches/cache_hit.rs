use criterion::{criterion_group, criterion_main, Criterion};
use dashboard_core::{CacheSettings, InMemoryStore, MetricCatalog, MetricsCache, REVOCATION};
use std::sync::Arc;

fn revocation_cache() -> MetricsCache {
    let bucket = "bench";
    let catalog = MetricCatalog::reference();
    let mut store = InMemoryStore::new();
    for file in catalog.files_for(REVOCATION).unwrap() {
        store = store.with_object(bucket, file.as_str(), r#"{"rows":[1,2,3,4,5]}"#);
    }
    MetricsCache::new(Arc::new(store), CacheSettings::new(bucket), catalog).unwrap()
}

fn bench_cache_hit(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = revocation_cache();
    runtime.block_on(cache.fetch_metrics(REVOCATION)).unwrap();

    c.bench_function("fetch_metrics_hit", |b| {
        b.to_async(&runtime)
            .iter(|| async { cache.fetch_metrics(REVOCATION).await.unwrap() })
    });
}

criterion_group!(benches, bench_cache_hit);
criterion_main!(benches);
