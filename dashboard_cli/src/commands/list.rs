use super::ConfigArgs;
use crate::ui;
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Metric type")]
    metric_type: String,
    #[tabled(rename = "Files")]
    file_count: usize,
    #[tabled(rename = "Bundle keys")]
    keys: String,
}

pub async fn execute(args: ConfigArgs) -> Result<()> {
    let config = args.load().await?;
    let catalog = config.catalog();

    ui::print_header("Metric Types");
    ui::print_setting("Bucket", &config.bucket);
    ui::print_setting("Store", config.store.description());
    ui::print_setting("TTL", format!("{}s", config.ttl_seconds));
    println!();

    let rows = catalog.metric_types.iter().map(|(metric_type, files)| CatalogRow {
        metric_type: metric_type.clone(),
        file_count: files.len(),
        keys: files
            .iter()
            .map(|f| catalog.file_key(f))
            .collect::<Vec<_>>()
            .join("\n"),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));

    ui::print_success(&format!(
        "{} metric types, {} files",
        catalog.len(),
        config.total_files()
    ));

    Ok(())
}
