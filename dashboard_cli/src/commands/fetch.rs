use super::ConfigArgs;
use crate::ui;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

pub async fn execute(args: ConfigArgs, metric_type: String, output: Option<PathBuf>) -> Result<()> {
    let config = args.load().await?;
    let cache = config.build_cache(None)?;

    info!(
        "Fetching {} metrics from bucket {} ({})",
        metric_type,
        config.bucket,
        config.store.description()
    );
    let bundle = cache.fetch_metrics(&metric_type).await?;
    let json = serde_json::to_string_pretty(&bundle)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            ui::print_success(&format!(
                "Wrote {} files of {} metrics to {}",
                bundle.len(),
                metric_type,
                path.display()
            ));
        }
        None => println!("{}", json),
    }

    Ok(())
}
