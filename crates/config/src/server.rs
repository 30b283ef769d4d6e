//! HTTP/websocket server configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"            # default
/// port = 8080                 # default
/// static_dir = "."            # served under /static
/// templates_path = "templates"
/// heartbeat_interval = "30s"  # websocket ping interval
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 8080
    pub port: u16,

    /// Directory served under `/static`
    /// Default: "."
    pub static_dir: PathBuf,

    /// Directory holding the page template `dlogs.html`
    /// Default: "templates"
    pub templates_path: PathBuf,

    /// Interval between websocket pings
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("."),
            templates_path: PathBuf::from("templates"),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
