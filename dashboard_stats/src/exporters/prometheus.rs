use crate::collector::CacheMetrics;
use crate::error::Result;
use prometheus::{Encoder, TextEncoder};

pub struct PrometheusExporter;

impl PrometheusExporter {
    pub const CONTENT_TYPE: &'static str = "text/plain; version=0.0.4";

    /// Renders the registry in the Prometheus text exposition format.
    pub fn format(metrics: &CacheMetrics) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = metrics.registry().gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CacheEventKind, CacheStatsCollector};
    use std::time::Duration;

    #[tokio::test]
    async fn test_exposition_contains_recorded_series() {
        let collector = CacheStatsCollector::new().unwrap();
        collector.record("revocation", CacheEventKind::Miss).await;
        collector
            .record(
                "revocation",
                CacheEventKind::FetchSucceeded {
                    elapsed: Duration::from_millis(120),
                },
            )
            .await;

        let text = PrometheusExporter::format(collector.metrics()).unwrap();
        assert!(text.contains(
            r#"dashboard_cache_requests_total{metric_type="revocation",outcome="miss"} 1"#
        ));
        assert!(text.contains(
            r#"dashboard_cache_fetches_total{metric_type="revocation",result="ok"} 1"#
        ));
        assert!(text.contains("dashboard_cache_fetch_duration_seconds_bucket"));
    }
}
