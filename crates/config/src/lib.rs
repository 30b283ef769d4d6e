//! Logcast Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logcast_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [source]
//! type = "docker"
//! ```

mod error;
mod hub;
mod logging;
mod server;
mod source;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use hub::HubConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::ServerConfig;
pub use source::{DEFAULT_DOCKER_ENDPOINT, SourceConfig, SourceKind};
pub use validation::{DOCKER_SCHEMES, MAX_HISTORY_CAPACITY};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Broadcast hub limits
    pub hub: HubConfig,

    /// HTTP/websocket server
    pub server: ServerConfig,

    /// Log source (Docker or stdin)
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Called after parsing, and again by the binary after CLI overrides are
    /// applied.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
