use super::ConfigArgs;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use dashboard_stats::{
    exporters::{JsonExporter, MarkdownExporter},
    CacheStatsCollector, StatsAggregator,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(args: ConfigArgs, report: Option<PathBuf>) -> Result<()> {
    let config = args.load().await?;
    let stats = CacheStatsCollector::new()?;
    let cache = config.build_cache(Some(Arc::new(stats.clone())))?;

    ui::print_header("Warming Metrics Cache");
    ui::print_setting("Bucket", &config.bucket);
    ui::print_setting("Store", config.store.description());
    ui::print_setting(
        "Metric types",
        format!("{} ({} files)", cache.metric_types().len(), config.total_files()),
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Fetching metric bundles...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let results = cache.warm_all().await;
    pb.finish_and_clear();

    println!("\n{}", "Results:".bold());
    for (metric_type, result) in &results {
        ui::print_outcome(metric_type, result);
    }
    let failures = results.iter().filter(|(_, r)| r.is_err()).count();

    let events = stats.get_events().await;
    let summary = StatsAggregator::aggregate(&events);
    println!("\n{}", "Statistics:".bold());
    ui::print_setting("Fetches", summary.fetches);
    ui::print_setting("Failed", summary.failed_fetches);
    ui::print_setting("Average", format!("{:?}", summary.average_fetch_latency));
    ui::print_setting("Slowest", format!("{:?}", summary.max_fetch_latency));

    if let Some(path) = report {
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        if is_json {
            JsonExporter::export(&summary, &path).await?;
        } else {
            let by_type = StatsAggregator::aggregate_by_type(&events);
            MarkdownExporter::export(&summary, &by_type, &path).await?;
        }
        ui::print_success(&format!("Report written to {}", path.display()));
    }

    if failures > 0 {
        ui::print_warning(&format!(
            "{} of {} metric types could not be loaded",
            failures,
            results.len()
        ));
        anyhow::bail!("{} metric types failed to load", failures);
    }

    ui::print_success("Cache is warm");
    Ok(())
}
