use crate::{
    bundle::MetricBundle,
    entry::{CacheEntry, EntryStatus},
    error::{CacheError, Result},
    fetch::fetch_and_merge,
    metric_type::{MetricCatalog, ADMISSION, REINCARCERATION, REVOCATION},
    observer::{DynObserver, NoopObserver},
    settings::{CacheSettings, StalePolicy},
    stores::DynObjectStore,
};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

type InflightFetch = Shared<BoxFuture<'static, Result<CacheEntry>>>;

#[derive(Default)]
struct SlotState {
    entry: Option<CacheEntry>,
    inflight: Option<InflightFetch>,
}

struct Inner {
    settings: CacheSettings,
    catalog: MetricCatalog,
    store: DynObjectStore,
    observer: DynObserver,
    slots: HashMap<String, Mutex<SlotState>>,
}

enum Lookup {
    Hit(MetricBundle),
    Wait { fetch: InflightFetch, coalesced: bool },
}

/// Read-through cache of metric bundles keyed by metric type.
///
/// Each metric type is fetched from the object store at most once per TTL
/// window. Concurrent misses for the same type share a single fetch, which
/// runs on its own task so that callers going away do not abandon it.
#[derive(Clone)]
pub struct MetricsCache {
    inner: Arc<Inner>,
}

impl MetricsCache {
    pub fn new(
        store: DynObjectStore,
        settings: CacheSettings,
        catalog: MetricCatalog,
    ) -> Result<Self> {
        Self::builder(store).settings(settings).catalog(catalog).build()
    }

    pub fn builder(store: DynObjectStore) -> MetricsCacheBuilder {
        MetricsCacheBuilder {
            store,
            settings: CacheSettings::default(),
            catalog: MetricCatalog::reference(),
            observer: None,
        }
    }

    /// Returns the bundle for `metric_type`, fetching it on a miss.
    pub async fn fetch_metrics(&self, metric_type: &str) -> Result<MetricBundle> {
        let slot = self
            .inner
            .slots
            .get(metric_type)
            .ok_or_else(|| CacheError::Configuration(metric_type.to_string()))?;

        let lookup = {
            let mut state = slot.lock().await;
            if let Some(entry) = state.entry.as_ref().filter(|e| e.is_fresh()) {
                Lookup::Hit(entry.bundle.clone())
            } else if let Some(fetch) = &state.inflight {
                Lookup::Wait {
                    fetch: fetch.clone(),
                    coalesced: true,
                }
            } else {
                let fetch = self.spawn_fetch(metric_type);
                state.inflight = Some(fetch.clone());
                Lookup::Wait {
                    fetch,
                    coalesced: false,
                }
            }
        };

        let (fetch, coalesced) = match lookup {
            Lookup::Hit(bundle) => {
                debug!("Serving {} metrics from cache", metric_type);
                self.inner.observer.on_hit(metric_type).await;
                return Ok(bundle);
            }
            Lookup::Wait { fetch, coalesced } => (fetch, coalesced),
        };

        if coalesced {
            debug!("Waiting on in-flight fetch of {} metrics", metric_type);
            self.inner.observer.on_coalesced(metric_type).await;
        } else {
            self.inner.observer.on_miss(metric_type).await;
        }

        match fetch.await {
            Ok(entry) => Ok(entry.bundle),
            Err(err) => self.fall_back(metric_type, slot, err).await,
        }
    }

    pub async fn fetch_admission_metrics(&self) -> Result<MetricBundle> {
        self.fetch_metrics(ADMISSION).await
    }

    pub async fn fetch_reincarceration_metrics(&self) -> Result<MetricBundle> {
        self.fetch_metrics(REINCARCERATION).await
    }

    pub async fn fetch_revocation_metrics(&self) -> Result<MetricBundle> {
        self.fetch_metrics(REVOCATION).await
    }

    /// Fetches every configured metric type concurrently.
    pub async fn warm_all(&self) -> Vec<(String, Result<MetricBundle>)> {
        let metric_types = self.metric_types();
        info!("Warming cache for {} metric types", metric_types.len());

        let results = join_all(metric_types.iter().map(|t| self.fetch_metrics(t))).await;
        metric_types.into_iter().zip(results).collect()
    }

    pub async fn status(&self) -> Vec<EntryStatus> {
        let mut statuses = Vec::with_capacity(self.inner.slots.len());
        for metric_type in self.inner.catalog.metric_types() {
            let Some(slot) = self.inner.slots.get(metric_type) else {
                continue;
            };
            let state = slot.lock().await;
            let in_flight = state.inflight.is_some();
            statuses.push(match &state.entry {
                Some(entry) => EntryStatus::from_entry(metric_type, entry, in_flight),
                None => EntryStatus::empty(metric_type, in_flight),
            });
        }
        statuses
    }

    pub fn metric_types(&self) -> Vec<String> {
        self.inner
            .catalog
            .metric_types()
            .map(str::to_string)
            .collect()
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.inner.catalog
    }

    pub fn store_name(&self) -> &str {
        self.inner.store.name()
    }

    fn spawn_fetch(&self, metric_type: &str) -> InflightFetch {
        let inner = Arc::clone(&self.inner);
        let metric_type = metric_type.to_string();
        let task = tokio::spawn(async move { inner.refresh(&metric_type).await });

        async move {
            task.await
                .unwrap_or_else(|e| Err(CacheError::Internal(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    async fn fall_back(
        &self,
        metric_type: &str,
        slot: &Mutex<SlotState>,
        err: CacheError,
    ) -> Result<MetricBundle> {
        if self.inner.settings.stale_policy != StalePolicy::ServeStale {
            return Err(err);
        }

        let stale = slot
            .lock()
            .await
            .entry
            .as_ref()
            .map(|entry| entry.bundle.clone());

        match stale {
            Some(bundle) => {
                warn!(
                    "Refreshing {} metrics failed ({}), serving stale bundle",
                    metric_type, err
                );
                self.inner.observer.on_stale_served(metric_type).await;
                Ok(bundle)
            }
            None => Err(err),
        }
    }
}

impl Inner {
    /// Runs one fetch-and-merge and installs the result. Only ever called by
    /// the task that owns the slot's in-flight marker.
    async fn refresh(&self, metric_type: &str) -> Result<CacheEntry> {
        let fetch_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("fetch", metric_type = %metric_type, fetch_id = %fetch_id);
        let started = Instant::now();

        let result = fetch_and_merge(
            self.store.as_ref(),
            &self.catalog,
            &self.settings.bucket,
            metric_type,
            self.settings.download_timeout,
        )
        .instrument(span)
        .await;
        let elapsed = started.elapsed();

        let slot = self
            .slots
            .get(metric_type)
            .ok_or_else(|| CacheError::Configuration(metric_type.to_string()))?;

        let outcome = {
            let mut state = slot.lock().await;
            state.inflight = None;
            match result {
                Ok(bundle) => {
                    let entry = CacheEntry::new(bundle, fetch_id, self.settings.ttl);
                    state.entry = Some(entry.clone());
                    info!(
                        "Cached {} metrics for {:?} (fetch took {:?})",
                        metric_type, self.settings.ttl, elapsed
                    );
                    Ok(entry)
                }
                Err(err) => {
                    warn!(
                        "Fetching {} metrics failed after {:?}: {}",
                        metric_type, elapsed, err
                    );
                    Err(err)
                }
            }
        };

        self.observer
            .on_fetch_complete(metric_type, elapsed, outcome.as_ref().map(|_| ()))
            .await;
        outcome
    }
}

pub struct MetricsCacheBuilder {
    store: DynObjectStore,
    settings: CacheSettings,
    catalog: MetricCatalog,
    observer: Option<DynObserver>,
}

impl MetricsCacheBuilder {
    pub fn settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn catalog(mut self, catalog: MetricCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn observer(mut self, observer: DynObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<MetricsCache> {
        if let Some((metric_type, _)) = self
            .catalog
            .metric_types
            .iter()
            .find(|(_, files)| files.is_empty())
        {
            return Err(CacheError::Configuration(metric_type.clone()));
        }

        let slots = self
            .catalog
            .metric_types()
            .map(|t| (t.to_string(), Mutex::new(SlotState::default())))
            .collect();

        Ok(MetricsCache {
            inner: Arc::new(Inner {
                settings: self.settings,
                catalog: self.catalog,
                store: self.store,
                observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
                slots,
            }),
        })
    }
}
