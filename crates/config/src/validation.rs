//! Configuration validation
//!
//! Validates config consistency:
//! - Hub limits are usable (non-zero queue, bounded history)
//! - The server has a port to bind
//! - The Docker endpoint has a supported scheme
//! - Intervals are non-zero

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::source::SourceKind;

/// Largest history the hub will keep
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

/// Endpoint schemes the Docker source can connect with
pub const DOCKER_SCHEMES: &[&str] = &["unix://", "tcp://", "http://"];

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_hub(config)?;
    validate_server(config)?;
    validate_source(config)?;
    Ok(())
}

fn validate_hub(config: &Config) -> Result<()> {
    let hub = &config.hub;

    if hub.queue_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "hub",
            "queue_capacity",
            "must be greater than 0",
        ));
    }

    if hub.history_capacity > MAX_HISTORY_CAPACITY {
        return Err(ConfigError::invalid_value(
            "hub",
            "history_capacity",
            format!("must be at most {}", MAX_HISTORY_CAPACITY),
        ));
    }

    non_zero("hub", "cleanup_interval", hub.cleanup_interval)
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.host.is_empty() {
        return Err(ConfigError::missing_field("server", "host"));
    }

    if server.port == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "port",
            "must be greater than 0",
        ));
    }

    non_zero("server", "heartbeat_interval", server.heartbeat_interval)
}

fn validate_source(config: &Config) -> Result<()> {
    let source = &config.source;

    // Stdin has nothing else to check
    if source.kind != SourceKind::Docker {
        return Ok(());
    }

    if source.endpoint.is_empty() {
        return Err(ConfigError::missing_field("source", "endpoint"));
    }

    if !DOCKER_SCHEMES
        .iter()
        .any(|scheme| source.endpoint.starts_with(scheme))
    {
        return Err(ConfigError::invalid_value(
            "source",
            "endpoint",
            format!(
                "'{}' must start with one of {}",
                source.endpoint,
                DOCKER_SCHEMES.join(", ")
            ),
        ));
    }

    non_zero("source", "poll_interval", source.poll_interval)?;
    non_zero("source", "retry_interval", source.retry_interval)
}

fn non_zero(section: &'static str, field: &'static str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(ConfigError::invalid_value(section, field, "must be non-zero"));
    }
    Ok(())
}
