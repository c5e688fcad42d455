pub mod bundle;
pub mod cache;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod metric_type;
pub mod observer;
pub mod settings;
pub mod stores;

pub use bundle::MetricBundle;
pub use cache::{MetricsCache, MetricsCacheBuilder};
pub use entry::{CacheEntry, EntryStatus};
pub use error::{CacheError, Result, StoreError};
pub use fetch::fetch_and_merge;
pub use metric_type::{MetricCatalog, ADMISSION, REINCARCERATION, REVOCATION};
pub use observer::{CacheObserver, DynObserver, NoopObserver};
pub use settings::{CacheSettings, StalePolicy};
pub use stores::{DynObjectStore, HttpStore, InMemoryStore, LocalFsStore, ObjectStore, StoreConfig};

// Re-export commonly used types
pub use async_trait::async_trait;
