//! Error types for the hub crate

use thiserror::Error;

/// Errors returned when a subscriber cannot be admitted
///
/// Ingestion, delivery and unsubscription never fail: malformed input is
/// repaired, slow subscribers lose lines, and removing an unknown subscriber
/// is a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Maximum subscribers reached
    #[error("maximum subscribers reached ({max})")]
    MaxSubscribers { max: usize },

    /// Hub has been shut down
    #[error("hub is shutting down")]
    ShuttingDown,
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;
