//! Docker Source - follows one container's log stream
//!
//! Selects the first running container that is not excluded (so logcast
//! never tails itself), follows its stdout (and optionally stderr) and feeds
//! every line into the hub.
//!
//! # Lifecycle
//!
//! ```text
//! connect ──→ list containers ──→ none eligible? sleep poll_interval, retry
//!                   │
//!                   ▼
//!             follow logs ──→ ingest each line
//!                   │
//!             stream ended/errored
//!                   │
//!                   ▼
//!             sleep retry_interval ──→ list containers ...
//! ```
//!
//! Cancellation stops the source at any point.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bollard::Docker;
use bollard::container::{ListContainersOptions, LogsOptions};
use bollard::models::ContainerSummary;
use futures_util::StreamExt;
use logcast_hub::BroadcastHub;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::split_lines;

/// Timeout for Docker API requests (seconds)
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Docker source configuration
#[derive(Debug, Clone)]
pub struct DockerSourceConfig {
    /// Docker endpoint (`unix://`, `tcp://` or `http://`)
    pub endpoint: String,

    /// Skip containers whose image or command contains this (empty = skip none)
    pub exclude: String,

    /// Wait between container list polls
    pub poll_interval: Duration,

    /// Wait before re-selecting after the stream ends
    pub retry_interval: Duration,

    /// Include stderr
    pub stderr: bool,

    /// Lines of existing output to request when starting to follow
    pub tail: usize,
}

impl Default for DockerSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "unix:///var/run/docker.sock".into(),
            exclude: "/dlogs".into(),
            poll_interval: Duration::from_secs(1),
            retry_interval: Duration::from_secs(5),
            stderr: false,
            tail: 250,
        }
    }
}

/// Parsed Docker endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// Unix socket path
    Unix(String),
    /// `host:port` reached over plain HTTP
    Http(String),
}

impl FromStr for DockerEndpoint {
    type Err = SourceError;

    fn from_str(endpoint: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| SourceError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        if let Some(path) = endpoint.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(Self::Unix(path.to_string()));
        }

        let addr = endpoint
            .strip_prefix("tcp://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .ok_or_else(|| invalid("expected unix://, tcp:// or http:// scheme"))?
            .trim_end_matches('/');

        if addr.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self::Http(addr.to_string()))
    }
}

impl DockerEndpoint {
    /// Create a client for this endpoint
    ///
    /// The client connects lazily; errors here are configuration errors.
    pub fn connect(&self) -> Result<Docker, SourceError> {
        let result = match self {
            Self::Unix(path) => {
                Docker::connect_with_unix(path, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            Self::Http(addr) => {
                Docker::connect_with_http(addr, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
        };

        result.map_err(|source| SourceError::Connect {
            endpoint: self.to_string(),
            source,
        })
    }
}

impl std::fmt::Display for DockerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path),
            Self::Http(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Pick the container to follow
///
/// Returns the first container with an ID whose image and command both do
/// not contain `exclude`. An empty `exclude` excludes nothing.
pub fn select_container<'a>(
    containers: &'a [ContainerSummary],
    exclude: &str,
) -> Option<&'a ContainerSummary> {
    containers
        .iter()
        .find(|container| container.id.is_some() && !is_excluded(container, exclude))
}

fn is_excluded(container: &ContainerSummary, exclude: &str) -> bool {
    if exclude.is_empty() {
        return false;
    }

    let image = container.image.as_deref().unwrap_or_default();
    let command = container.command.as_deref().unwrap_or_default();
    image.contains(exclude) || command.contains(exclude)
}

/// The container currently being followed
#[derive(Debug, Clone)]
struct Target {
    id: String,
    image: String,
}

/// Docker log source
pub struct DockerSource {
    config: DockerSourceConfig,
    hub: Arc<BroadcastHub>,
}

impl DockerSource {
    /// Create a new Docker source feeding `hub`
    pub fn new(config: DockerSourceConfig, hub: Arc<BroadcastHub>) -> Self {
        Self { config, hub }
    }

    /// Get the configuration
    pub fn config(&self) -> &DockerSourceConfig {
        &self.config
    }

    /// Run until cancelled
    ///
    /// Only endpoint and client construction errors are returned. Failures
    /// talking to the daemon are logged and retried.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SourceError> {
        let endpoint: DockerEndpoint = self.config.endpoint.parse()?;
        let docker = endpoint.connect()?;

        tracing::info!(
            endpoint = %endpoint,
            exclude = %self.config.exclude,
            "docker source started"
        );

        let mut last_followed: Option<String> = None;

        while let Some(target) = self.wait_for_container(&docker, &cancel).await {
            // Re-following the same container must not replay its tail again
            let tail = if last_followed.as_deref() == Some(target.id.as_str()) {
                0
            } else {
                self.config.tail
            };

            let chunks = self.follow(&docker, &target, tail, &cancel).await;
            last_followed = Some(target.id);

            if cancel.is_cancelled() {
                break;
            }

            tracing::warn!(
                image = %target.image,
                chunks,
                retry_in = ?self.config.retry_interval,
                "container log stream ended"
            );

            if !sleep_or_cancel(self.config.retry_interval, &cancel).await {
                break;
            }
        }

        tracing::info!("docker source stopped");
        Ok(())
    }

    /// Poll the container list until one is eligible
    ///
    /// Returns `None` if cancelled first.
    async fn wait_for_container(
        &self,
        docker: &Docker,
        cancel: &CancellationToken,
    ) -> Option<Target> {
        loop {
            let options = ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            };

            let wait = match docker.list_containers(Some(options)).await {
                Ok(containers) => {
                    if let Some(container) = select_container(&containers, &self.config.exclude)
                        && let Some(id) = container.id.clone()
                    {
                        let target = Target {
                            id,
                            image: container.image.clone().unwrap_or_default(),
                        };
                        tracing::info!(
                            container_id = %target.id,
                            image = %target.image,
                            names = ?container.names,
                            "tracking container"
                        );
                        return Some(target);
                    }

                    tracing::debug!(
                        containers = containers.len(),
                        "no eligible container, polling"
                    );
                    self.config.poll_interval
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to list containers");
                    self.config.retry_interval
                }
            };

            if !sleep_or_cancel(wait, cancel).await {
                return None;
            }
        }
    }

    /// Follow a container's logs until the stream ends or cancellation
    ///
    /// Returns the number of chunks received.
    async fn follow(
        &self,
        docker: &Docker,
        target: &Target,
        tail: usize,
        cancel: &CancellationToken,
    ) -> u64 {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: self.config.stderr,
            tail: tail.to_string(),
            ..Default::default()
        };

        let mut stream = std::pin::pin!(docker.logs(&target.id, Some(options)));
        let mut chunks = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                item = stream.next() => match item {
                    Some(Ok(output)) => {
                        chunks += 1;
                        let bytes = output.into_bytes();
                        for line in split_lines(&bytes) {
                            self.hub.ingest(line);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            container_id = %target.id,
                            error = %e,
                            "log stream error"
                        );
                        break;
                    }
                    None => break,
                },
            }
        }

        chunks
    }
}

/// Sleep unless cancelled first; false means cancelled
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
