pub mod collector;
pub mod aggregator;
pub mod error;
pub mod exporters;

pub use collector::{
    CacheEvent, CacheEventKind, CacheMetrics, CacheStatsCollector, DEFAULT_EVENT_CAPACITY,
};
pub use aggregator::{CacheSummary, StatsAggregator};
pub use error::{Result, StatsError};
