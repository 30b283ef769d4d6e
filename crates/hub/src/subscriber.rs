//! Subscriber management for connected clients
//!
//! Each connected client gets a `Subscriber` instance that tracks:
//! - Unique ID for the connection
//! - Bounded channel sender for line delivery
//! - Liveness state (active, closing, closed)
//! - Delivered and dropped line counters
//!
//! The `SubscriberRegistry` handles registration, removal, and fan-out.
//! Fan-out iterates a snapshot of the registry taken under the read lock and
//! delivers with `try_send`, so a full queue costs that subscriber one line
//! and never stalls the producer, other subscribers, or registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::{HubError, Result};
use crate::line::LogLine;

/// Counter for generating unique subscriber IDs
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default number of consecutive drops before a subscriber is disconnected
pub const DEFAULT_MAX_CONSECUTIVE_DROPS: u64 = 500;

/// Opaque subscriber identity, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Liveness of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubscriberState {
    /// Registered and eligible for broadcasts
    Active = 0,
    /// Disconnect decided, removal from the registry pending
    Closing = 1,
    /// Unregistered, endpoint released
    Closed = 2,
}

impl SubscriberState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Shared view of a subscriber's state and counters
///
/// Held by both the registry entry and the client's `Subscription`, so the
/// transport can observe drops without keeping the endpoint alive.
#[derive(Debug)]
pub struct SubscriberStatus {
    state: AtomicU8,
    delivered: AtomicU64,
    dropped: AtomicU64,
    consecutive_drops: AtomicU64,
}

impl SubscriberStatus {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(SubscriberState::Active as u8),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            consecutive_drops: AtomicU64::new(0),
        }
    }

    /// Current liveness state
    #[inline]
    pub fn state(&self) -> SubscriberState {
        SubscriberState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Lines handed to the subscriber's queue
    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Lines dropped because the queue was full (never decreases)
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drops since the last successful delivery
    #[inline]
    pub fn consecutive_drops(&self) -> u64 {
        self.consecutive_drops.load(Ordering::Relaxed)
    }

    /// Move from active to closing; false if already closing or closed
    fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                SubscriberState::Active as u8,
                SubscriberState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn mark_closed(&self) {
        self.state.store(SubscriberState::Closed as u8, Ordering::Release);
    }
}

/// Result of offering one line to one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Line queued
    Sent,
    /// Queue full, line dropped for this subscriber
    Dropped {
        /// Drops in a row including this one
        consecutive: u64,
    },
    /// Receiver is gone (client disconnected)
    Disconnected,
    /// Subscriber is closing or closed, line skipped
    Inactive,
}

/// A single subscriber (connected client)
#[derive(Debug)]
pub struct Subscriber {
    /// Unique identifier
    id: SubscriberId,
    /// Channel sender for line delivery
    sender: mpsc::Sender<LogLine>,
    /// State and counters shared with the client
    status: Arc<SubscriberStatus>,
}

impl Subscriber {
    /// Create a new subscriber around a bounded sender
    pub fn new(sender: mpsc::Sender<LogLine>) -> Self {
        Self {
            id: SubscriberId::next(),
            sender,
            status: Arc::new(SubscriberStatus::new()),
        }
    }

    /// Get the subscriber ID
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Get the shared status
    #[inline]
    pub fn status(&self) -> &Arc<SubscriberStatus> {
        &self.status
    }

    /// Offer a line without waiting
    pub fn try_deliver(&self, line: &LogLine) -> Delivery {
        if self.status.state() != SubscriberState::Active {
            return Delivery::Inactive;
        }

        match self.sender.try_send(line.clone()) {
            Ok(()) => {
                self.status.consecutive_drops.store(0, Ordering::Relaxed);
                self.status.delivered.fetch_add(1, Ordering::Relaxed);
                Delivery::Sent
            }
            Err(TrySendError::Full(_)) => {
                self.status.dropped.fetch_add(1, Ordering::Relaxed);
                let previous = self
                    .status
                    .consecutive_drops
                    .fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped {
                    consecutive: previous + 1,
                }
            }
            Err(TrySendError::Closed(_)) => Delivery::Disconnected,
        }
    }

    /// Check if this subscriber's receiver still exists
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    fn close(&self) {
        self.status.mark_closed();
    }
}

/// Counts from a single fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Subscribers that queued the line
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers removed during this broadcast
    pub evicted: usize,
}

/// Manages all active subscribers
#[derive(Debug)]
pub struct SubscriberRegistry {
    /// Active subscribers
    subscribers: RwLock<HashMap<SubscriberId, Arc<Subscriber>>>,
    /// Registration cap (0 = unlimited)
    max_subscribers: usize,
    /// Consecutive drops before forced disconnect (0 = never)
    max_consecutive_drops: u64,
}

impl SubscriberRegistry {
    /// Create a new registry with no subscriber cap
    pub fn new() -> Self {
        Self::with_limits(0, DEFAULT_MAX_CONSECUTIVE_DROPS)
    }

    /// Create a registry with a subscriber cap and slow-subscriber threshold
    pub fn with_limits(max_subscribers: usize, max_consecutive_drops: u64) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            max_subscribers,
            max_consecutive_drops,
        }
    }

    /// Register a new subscriber with a queue of `queue_capacity` lines
    ///
    /// Returns the subscriber ID, its shared status, and the receiving end of
    /// its queue.
    pub fn register(
        &self,
        queue_capacity: usize,
    ) -> Result<(SubscriberId, Arc<SubscriberStatus>, mpsc::Receiver<LogLine>)> {
        let mut subscribers = self.subscribers.write();

        if self.max_subscribers > 0 && subscribers.len() >= self.max_subscribers {
            return Err(HubError::MaxSubscribers {
                max: self.max_subscribers,
            });
        }

        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let subscriber = Subscriber::new(sender);
        let id = subscriber.id();
        let status = Arc::clone(subscriber.status());

        subscribers.insert(id, Arc::new(subscriber));

        Ok((id, status, receiver))
    }

    /// Unregister by ID
    ///
    /// Returns whether the subscriber was present. Removing an unknown or
    /// already removed ID is a no-op.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id);

        match removed {
            Some(subscriber) => {
                subscriber.close();
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current subscribers
    pub fn each(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().values().cloned().collect()
    }

    /// Get number of active subscribers
    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if there are any subscribers
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Check if an ID is currently registered
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    /// Broadcast a line to all subscribers
    ///
    /// The registry lock is only held while taking the snapshot. Subscribers
    /// whose receiver is gone, or that exceeded the consecutive drop
    /// threshold, are unregistered afterwards.
    pub fn broadcast(&self, line: &LogLine) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut to_remove = Vec::new();

        for subscriber in self.each() {
            match subscriber.try_deliver(line) {
                Delivery::Sent => outcome.delivered += 1,
                Delivery::Dropped { consecutive } => {
                    outcome.dropped += 1;

                    if self.max_consecutive_drops > 0
                        && consecutive >= self.max_consecutive_drops
                        && subscriber.status().begin_close()
                    {
                        warn!(
                            subscriber_id = %subscriber.id(),
                            consecutive,
                            dropped = subscriber.status().dropped(),
                            "subscriber too slow, disconnecting"
                        );
                        to_remove.push(subscriber.id());
                    }
                }
                Delivery::Disconnected => {
                    debug!(subscriber_id = %subscriber.id(), "subscriber receiver gone");
                    to_remove.push(subscriber.id());
                }
                Delivery::Inactive => {}
            }
        }

        for id in to_remove {
            if self.unregister(id) {
                outcome.evicted += 1;
            }
        }

        outcome
    }

    /// Clean up subscribers whose receiver was dropped without unregistering
    pub fn cleanup_disconnected(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();

        subscribers.retain(|_, subscriber| {
            let connected = subscriber.is_connected();
            if !connected {
                subscriber.close();
            }
            connected
        });

        original_len - subscribers.len()
    }

    /// Unregister every subscriber, releasing their endpoints
    pub fn drain(&self) -> usize {
        let drained: Vec<Arc<Subscriber>> = {
            let mut subscribers = self.subscribers.write();
            subscribers.drain().map(|(_, subscriber)| subscriber).collect()
        };

        for subscriber in &drained {
            subscriber.close();
        }

        drained.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
