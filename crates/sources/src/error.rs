//! Source error types

use thiserror::Error;

/// Errors from log producers
#[derive(Error, Debug)]
pub enum SourceError {
    /// Endpoint string could not be understood
    #[error("invalid docker endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: &'static str,
    },

    /// Failed to create the Docker client
    #[error("failed to connect to docker at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: bollard::errors::Error,
    },

    /// Docker API error
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
