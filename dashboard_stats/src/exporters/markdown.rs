use crate::aggregator::CacheSummary;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

pub struct MarkdownExporter;

impl MarkdownExporter {
    pub async fn export(
        summary: &CacheSummary,
        by_type: &BTreeMap<String, CacheSummary>,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let markdown = Self::format(summary, by_type);
        tokio::fs::write(path, markdown).await?;
        Ok(())
    }

    pub fn format(summary: &CacheSummary, by_type: &BTreeMap<String, CacheSummary>) -> String {
        let per_type = by_type
            .iter()
            .map(|(metric_type, s)| {
                format!(
                    "| {} | {} | {} | {} | {} | {:?} |",
                    metric_type, s.hits, s.misses, s.fetches, s.failed_fetches, s.max_fetch_latency
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let failures = if summary.failures_by_kind.is_empty() {
            "None.".to_string()
        } else {
            summary
                .failures_by_kind
                .iter()
                .map(|(kind, count)| format!("- **{}**: {}", kind, count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"# Metrics Cache Report

## Summary Statistics

| Metric | Value |
|--------|-------|
| Total Requests | {} |
| Hits | {} |
| Misses | {} |
| Coalesced Waits | {} |
| Stale Serves | {} |
| Hit Ratio | {:.2}% |
| Fetches | {} |
| Failed Fetches | {} |

## Fetch Latency

| Percentile | Latency |
|------------|---------|
| P50 | {:?} |
| P95 | {:?} |
| P99 | {:?} |
| Average | {:?} |
| Min | {:?} |
| Max | {:?} |

## By Metric Type

| Metric Type | Hits | Misses | Fetches | Failed | Max Fetch Latency |
|-------------|------|--------|---------|--------|-------------------|
{}

## Failures

{}
"#,
            summary.total_requests,
            summary.hits,
            summary.misses,
            summary.coalesced,
            summary.stale_served,
            summary.hit_ratio * 100.0,
            summary.fetches,
            summary.failed_fetches,
            summary.fetch_latency_p50,
            summary.fetch_latency_p95,
            summary.fetch_latency_p99,
            summary.average_fetch_latency,
            summary.min_fetch_latency,
            summary.max_fetch_latency,
            per_type,
            failures,
        )
    }
}
