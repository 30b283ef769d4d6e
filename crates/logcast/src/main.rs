//! Logcast - live container logs in the browser
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! logcast
//! logcast --config logcast.toml
//! logcast serve --port 9000 --docker-endpoint tcp://10.0.0.5:2375
//!
//! # Broadcast piped output instead of a container
//! my-service 2>&1 | logcast serve --stdin
//!
//! # Follow a running server from the terminal
//! logcast tail --url ws://localhost:8080/logs
//! ```

mod cmd;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logcast_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Time allowed for blocking tasks (stdin reads) after the server stops
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Logcast - live container logs in the browser
#[derive(Parser, Debug)]
#[command(name = "logcast")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),

    /// Print lines from a running server
    Tail(cmd::tail::TailArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let result = runtime.block_on(run(cli));

    // A pending stdin read would otherwise keep the process alive
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Serve(args)) => {
            let config_path = cmd::serve::find_config_path(cli.config.as_deref());
            let (level, format) =
                resolve_logging(cli.log_level.as_deref(), config_path.as_deref());
            init_logging(&level, format)?;
            cmd::serve::run(cli.config, args).await
        }
        Some(Command::Tail(args)) => {
            // Tail initializes its own logging (stderr, stdout carries lines)
            cmd::tail::run(args, cli.log_level.as_deref()).await
        }
        // No subcommand = run server (default behavior)
        None => {
            let config_path = cmd::serve::find_config_path(cli.config.as_deref());
            let (level, format) =
                resolve_logging(cli.log_level.as_deref(), config_path.as_deref());
            init_logging(&level, format)?;
            cmd::serve::run(cli.config, cmd::serve::ServeArgs::default()).await
        }
    }
}

/// Resolve log level and format: CLI flag > config file > default "info"
fn resolve_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> (String, LogFormat) {
    let config = config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok());

    let format = config
        .as_ref()
        .map(|config| config.log.format)
        .unwrap_or_default();

    // CLI flag takes precedence
    if let Some(level) = cli_level {
        return (level.to_string(), format);
    }

    let level = config
        .map(|config| config.log.level.as_str())
        .unwrap_or("info");

    (level.to_string(), format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .init(),
    }

    Ok(())
}
