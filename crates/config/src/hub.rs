//! Hub configuration
//!
//! History size and backpressure limits for the broadcast hub.

use std::time::Duration;

use serde::Deserialize;

/// Hub configuration
///
/// # Example
///
/// ```toml
/// [hub]
/// history_capacity = 250
/// queue_capacity = 10
/// max_consecutive_drops = 500
/// max_subscribers = 0
/// cleanup_interval = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Lines replayed to a new subscriber (0 disables history)
    /// Default: 250
    pub history_capacity: usize,

    /// Per-subscriber queue capacity
    /// Default: 10
    pub queue_capacity: usize,

    /// Consecutive dropped lines before a subscriber is disconnected
    /// Default: 500 (0 = never)
    pub max_consecutive_drops: u64,

    /// Maximum concurrent subscribers
    /// Default: 0 (unlimited)
    pub max_subscribers: usize,

    /// How often disconnected subscribers are swept
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: 250,
            queue_capacity: 10,
            max_consecutive_drops: 500,
            max_subscribers: 0,
            cleanup_interval: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.history_capacity, 250);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.max_consecutive_drops, 500);
        assert_eq!(config.max_subscribers, 0);
        assert_eq!(config.cleanup_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
history_capacity = 1000
cleanup_interval = "250ms"
"#;
        let config: HubConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.history_capacity, 1000);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.cleanup_interval, Duration::from_millis(250));
    }
}
