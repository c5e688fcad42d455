pub mod config;
pub mod parser;

pub use config::{ConfigFile, DashboardConfig, DashboardConfigBuilder};
pub use parser::{parse_config_from_file, parse_config_from_str};
