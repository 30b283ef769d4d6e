//! Serve command - Run the logcast server
//!
//! Wires config → hub → log source → web server, then waits for Ctrl-C or
//! SIGTERM and shuts everything down in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use logcast_config::{Config, HubConfig, SourceKind};
use logcast_hub::{BroadcastHub, HubOptions};
use logcast_sources::{DockerSource, DockerSourceConfig, ReaderSource};
use logcast_web::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Config files tried, in order, when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["logcast.toml", "configs/logcast.toml"];

/// Time each task gets to finish after cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve command arguments
///
/// Every flag overrides the matching config file value.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory whose `static/` subtree is served under /static
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Directory containing dlogs.html
    #[arg(long)]
    pub templates_path: Option<PathBuf>,

    /// Docker API endpoint (unix://, tcp:// or http://)
    #[arg(long)]
    pub docker_endpoint: Option<String>,

    /// Read log lines from stdin instead of Docker (wins over --docker-endpoint)
    #[arg(long)]
    pub stdin: bool,
}

/// Config path to use: the explicit one, else the first default that exists
pub fn find_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Run the serve command
pub async fn run(config_path: Option<PathBuf>, args: ServeArgs) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "logcast starting"
    );

    let mut config = load_config(config_path.as_deref())?;
    apply_overrides(&mut config, &args);
    config
        .validate()
        .context("invalid configuration after command line overrides")?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("logcast shutdown complete");
    Ok(())
}

/// Load configuration from the explicit path, a default path, or defaults
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        // User explicitly provided config path - must exist
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "config file not found: {}",
                path.display()
            ));
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    match find_config_path(None) {
        Some(path) => {
            info!(config = %path.display(), "using config file");
            Config::from_file(&path).context("failed to load configuration")
        }
        None => {
            info!("no config file found, using defaults (docker → port 8080)");
            Ok(Config::default())
        }
    }
}

/// Apply command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref dir) = args.static_dir {
        config.server.static_dir = dir.clone();
    }
    if let Some(ref path) = args.templates_path {
        config.server.templates_path = path.clone();
    }
    if let Some(ref endpoint) = args.docker_endpoint {
        config.source.kind = SourceKind::Docker;
        config.source.endpoint = endpoint.clone();
    }
    if args.stdin {
        config.source.kind = SourceKind::Stdin;
    }
}

/// Hub options from the `[hub]` section
fn hub_options(config: &HubConfig) -> HubOptions {
    HubOptions::default()
        .history_capacity(config.history_capacity)
        .queue_capacity(config.queue_capacity)
        .max_consecutive_drops(config.max_consecutive_drops)
        .max_subscribers(config.max_subscribers)
}

/// Docker source settings from the `[source]` section
///
/// The initial tail matches the history size so a fresh server can replay
/// a full history immediately.
fn docker_config(config: &Config) -> DockerSourceConfig {
    DockerSourceConfig {
        endpoint: config.source.endpoint.clone(),
        exclude: config.source.exclude.clone(),
        poll_interval: config.source.poll_interval,
        retry_interval: config.source.retry_interval,
        stderr: config.source.stderr,
        tail: config.hub.history_capacity,
    }
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    // Create cancellation token for coordinated shutdown
    let cancel = CancellationToken::new();

    let hub = Arc::new(BroadcastHub::with_options(hub_options(&config.hub)));
    let maintenance_task = hub.spawn_maintenance(config.hub.cleanup_interval, cancel.clone());

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    let source_task = spawn_source(&config, Arc::clone(&hub), cancel.clone());

    let state = AppState::new(Arc::clone(&hub))
        .with_templates_path(config.server.templates_path.clone())
        .with_static_dir(config.server.static_dir.clone())
        .with_heartbeat_interval(config.server.heartbeat_interval);

    let server_cancel = cancel.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = logcast_web::serve(listener, state, server_cancel).await {
            error!(error = %e, "web server error");
        }
    });

    info!(
        addr = %addr,
        source = ?config.source.kind,
        history_capacity = config.hub.history_capacity,
        queue_capacity = config.hub.queue_capacity,
        "logcast running"
    );

    // Wait for shutdown signal
    wait_for_shutdown().await;

    info!("shutdown signal received, stopping server...");

    // Stop the source and the listener, then release every websocket
    cancel.cancel();
    let released = hub.shutdown();
    info!(released, "subscribers released");

    for (name, task) in [
        ("source", source_task),
        ("web server", server_task),
        ("maintenance", maintenance_task),
    ] {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = name, error = %e, "task panicked during shutdown"),
            Err(_) => warn!(task = name, "task did not finish within timeout"),
        }
    }

    let stats = hub.stats();
    info!(
        ingested = stats.ingested,
        delivered = stats.delivered,
        dropped = stats.dropped,
        evicted = stats.evicted,
        "final hub stats"
    );

    Ok(())
}

/// Spawn the configured log source
fn spawn_source(
    config: &Config,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    match config.source.kind {
        SourceKind::Docker => {
            let source = DockerSource::new(docker_config(config), hub);
            tokio::spawn(async move {
                if let Err(e) = source.run(cancel).await {
                    error!(source = "docker", error = %e, "source error");
                }
            })
        }
        SourceKind::Stdin => {
            let source = ReaderSource::stdin(hub);
            tokio::spawn(async move {
                match source.run(cancel).await {
                    Ok(lines) => info!(source = "stdin", lines, "input closed"),
                    Err(e) => error!(source = "stdin", error = %e, "source error"),
                }
            })
        }
    }
}

/// Wait for Ctrl-C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod tests;
