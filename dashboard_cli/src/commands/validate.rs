use crate::ui;
use anyhow::Result;
use dashboard_config::parse_config_from_file;
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    ui::print_header("Validating Configuration");
    ui::print_setting("File", config_file.display());

    match parse_config_from_file(&config_file).await {
        Ok(config) => {
            ui::print_success("Configuration is valid!");
            println!("\nConfiguration Details:");
            ui::print_setting("Bucket", &config.bucket);
            ui::print_setting("Store", config.store.description());
            ui::print_setting("TTL", format!("{}s", config.ttl_seconds));
            ui::print_setting("Timeout", format!("{:?}", config.download_timeout));
            ui::print_setting("Stale policy", format!("{:?}", config.stale_policy));

            for (metric_type, files) in &config.metric_types {
                println!("\n  {}: {} files", metric_type, files.len());
                for (i, file) in files.iter().enumerate() {
                    println!("    {}: {}", i + 1, file);
                }
            }

            Ok(())
        }
        Err(e) => {
            ui::print_error("Configuration is invalid!");
            println!("\nError: {}", e);
            Err(e)
        }
    }
}
