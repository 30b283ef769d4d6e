//! Logcast Hub - in-process log broadcast with history replay
//!
//! This crate sits between a single log producer and any number of live
//! subscribers. It:
//!
//! - Repairs invalid UTF-8 in producer chunks before anything sees them
//! - Keeps the most recent lines in a bounded history for late joiners
//! - Fans each line out to every subscriber without waiting on any of them
//! - Disconnects subscribers that fall too far behind
//!
//! The transport (websocket, stdout, tests) and the producer (container
//! logs, stdin) live outside this crate.
//!
//! # Architecture
//!
//! ```text
//! Producer chunk (bytes)
//!     │
//!     ▼
//! sanitize() ──→ LogLine (Arc<str>)
//!     │
//!     ▼
//! BroadcastHub.ingest() ◄── sequencing lock
//!     │
//!     ├──→ HistoryBuffer (last N lines)
//!     │
//!     └──→ SubscriberRegistry.broadcast()
//!               │
//!               ▼
//!          Subscribers (bounded per-client queues, try_send)
//!               │
//!               ▼
//!          Subscription: replay snapshot, then live lines
//! ```

pub mod buffer;
mod error;
pub mod hub;
pub mod line;
pub mod sanitize;
pub mod subscriber;

pub use buffer::HistoryBuffer;
pub use error::{HubError, Result};
pub use hub::{BroadcastHub, HubOptions, HubStats, Subscription};
pub use line::LogLine;
pub use sanitize::sanitize;
pub use subscriber::{SubscriberId, SubscriberRegistry, SubscriberState, SubscriberStatus};
