//! Application state
//!
//! Shared state for handlers: the hub plus the paths and timings the server
//! was started with.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use logcast_hub::BroadcastHub;

/// Default websocket ping interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The broadcast hub
    pub hub: Arc<BroadcastHub>,
    /// Directory holding `dlogs.html`
    pub templates_path: PathBuf,
    /// Directory whose `static/` subtree is served under `/static`
    pub static_dir: PathBuf,
    /// Interval between websocket pings
    pub heartbeat_interval: Duration,
    /// Server start time for uptime calculation
    pub started_at: Instant,
}

impl AppState {
    /// Create state with default paths and heartbeat
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self {
            hub,
            templates_path: PathBuf::from("templates"),
            static_dir: PathBuf::from("."),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            started_at: Instant::now(),
        }
    }

    /// Set the templates directory
    pub fn with_templates_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates_path = path.into();
        self
    }

    /// Set the static files root
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = path.into();
        self
    }

    /// Set the websocket ping interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
