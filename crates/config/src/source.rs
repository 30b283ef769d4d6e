//! Log source configuration
//!
//! Selects where lines come from: the Docker daemon (default) or stdin.

use std::time::Duration;

use serde::Deserialize;

/// Default Docker daemon endpoint
pub const DEFAULT_DOCKER_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Kind of log source
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Follow a container's logs through the Docker API (default)
    #[default]
    Docker,
    /// Read lines from standard input
    Stdin,
}

/// Source configuration
///
/// # Example
///
/// ```toml
/// [source]
/// type = "docker"
/// endpoint = "unix:///var/run/docker.sock"
/// exclude = "/dlogs"
/// poll_interval = "1s"
/// retry_interval = "5s"
/// stderr = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source kind (docker, stdin)
    /// Default: docker
    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// Docker endpoint (`unix://`, `tcp://` or `http://`)
    /// Default: "unix:///var/run/docker.sock"
    pub endpoint: String,

    /// Containers whose image or command contains this are never followed
    /// Default: "/dlogs"
    pub exclude: String,

    /// Wait between container list polls while none is eligible
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Wait before re-selecting after the log stream ends
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Include the container's stderr stream
    /// Default: false
    pub stderr: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Docker,
            endpoint: DEFAULT_DOCKER_ENDPOINT.to_string(),
            exclude: "/dlogs".to_string(),
            poll_interval: Duration::from_secs(1),
            retry_interval: Duration::from_secs(5),
            stderr: false,
        }
    }
}
