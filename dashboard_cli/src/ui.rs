// Terminal output for dashboard commands
use colored::Colorize;
use dashboard_core::{CacheError, MetricBundle};
use std::fmt::Display;

pub fn print_header(text: &str) {
    println!("\n{}", text.bold().cyan());
    println!("{}", "=".repeat(text.len()).cyan());
}

/// One aligned `label: value` line of run settings.
pub fn print_setting(label: &str, value: impl Display) {
    println!("{:>14}: {}", label, value);
}

pub fn print_success(text: &str) {
    println!("{} {}", "✓".green().bold(), text.green());
}

pub fn print_error(text: &str) {
    println!("{} {}", "✗".red().bold(), text.red());
}

pub fn print_warning(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Result line for one metric type, tagging failures with their error kind.
pub fn print_outcome(metric_type: &str, result: &Result<MetricBundle, CacheError>) {
    match result {
        Ok(bundle) => print_success(&format!("{}: {} files", metric_type, bundle.len())),
        Err(e) => print_error(&format!("{}: [{}] {}", metric_type, e.kind(), e)),
    }
}
