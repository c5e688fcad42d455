mod commands;
mod ui;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use commands::ConfigArgs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt::writer::BoxMakeWriter, EnvFilter};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Cached metric bundles for the corrections dashboard", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one metric type and print its bundle as JSON
    Fetch {
        /// Metric type to fetch (e.g. admission)
        metric_type: String,

        #[command(flatten)]
        config: ConfigArgs,

        /// Write the bundle to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch every configured metric type and report cache statistics
    Warm {
        #[command(flatten)]
        config: ConfigArgs,

        /// Write a statistics report (.json for JSON, Markdown otherwise)
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List configured metric types and their files
    List {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file (YAML, TOML, or JSON)
        config_file: PathBuf,
    },

    /// Serve metric bundles over HTTP
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,

        /// Fetch every metric type before accepting requests
        #[arg(long)]
        prewarm: bool,
    },
}

fn init_logging(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (writer, guard) = match &cli.log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(cli.log_file.is_none())
        .with_writer(writer);

    match cli.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli)?;

    match cli.command {
        Commands::Fetch {
            metric_type,
            config,
            output,
        } => {
            commands::fetch::execute(config, metric_type, output).await?;
        }

        Commands::Warm { config, report } => {
            commands::warm::execute(config, report).await?;
        }

        Commands::List { config } => {
            commands::list::execute(config).await?;
        }

        Commands::Validate { config_file } => {
            commands::validate::execute(config_file).await?;
        }

        Commands::Serve {
            config,
            addr,
            prewarm,
        } => {
            commands::serve::execute(config, addr, prewarm).await?;
        }
    }

    Ok(())
}
