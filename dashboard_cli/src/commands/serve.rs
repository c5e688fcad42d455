use super::ConfigArgs;
use crate::ui;
use anyhow::Result;
use dashboard_server::AppState;
use dashboard_stats::CacheStatsCollector;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn execute(args: ConfigArgs, addr: SocketAddr, prewarm: bool) -> Result<()> {
    let config = args.load().await?;
    let stats = CacheStatsCollector::metrics_only()?;
    let cache = config.build_cache(Some(Arc::new(stats.clone())))?;

    ui::print_header("Dashboard API");
    ui::print_setting("Bucket", &config.bucket);
    ui::print_setting("Store", config.store.description());
    ui::print_setting("TTL", format!("{}s", config.ttl_seconds));
    ui::print_setting("Listening on", addr);

    if prewarm {
        info!("Prewarming cache before accepting requests");
        for (metric_type, result) in cache.warm_all().await {
            if let Err(e) = result {
                warn!("Prewarming {} metrics failed: {}", metric_type, e);
            }
        }
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down");
                signal.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl+C, stop the process to exit: {}", e),
        }
    });

    dashboard_server::serve(AppState::new(cache, stats), addr, shutdown).await?;
    ui::print_success("Server stopped");
    Ok(())
}
