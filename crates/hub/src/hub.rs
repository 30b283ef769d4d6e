//! BroadcastHub - the single point between the log producer and subscribers
//!
//! `BroadcastHub` owns the history buffer and the subscriber registry. It
//! provides:
//!
//! - `ingest` for the producer: sanitize, append to history, fan out
//! - `subscribe` for the transport: register, then replay history
//! - Slow-subscriber handling (drop per line, evict past a threshold)
//! - Explicit shutdown that releases every subscriber endpoint
//!
//! # Usage
//!
//! ```
//! use logcast_hub::BroadcastHub;
//!
//! let hub = BroadcastHub::new();
//!
//! // Producer side:
//! hub.ingest(b"service started");
//!
//! // Transport side:
//! let subscription = hub.subscribe().unwrap();
//! assert_eq!(subscription.pending_replay(), 1);
//! hub.unsubscribe(subscription.id());
//! ```
//!
//! # Ordering
//!
//! `ingest` appends and broadcasts while holding the sequencing lock, and
//! `subscribe` registers and snapshots history while holding the same lock.
//! A line is therefore either in a new subscriber's replay or in its live
//! queue, never both and never neither. Delivery itself never waits, so the
//! lock is held only for the duration of a non-blocking fan-out.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::buffer::{DEFAULT_CAPACITY, HistoryBuffer};
use crate::error::{HubError, Result};
use crate::line::LogLine;
use crate::sanitize::sanitize;
use crate::subscriber::{
    DEFAULT_MAX_CONSECUTIVE_DROPS, DEFAULT_QUEUE_CAPACITY, SubscriberId, SubscriberRegistry,
    SubscriberStatus,
};

/// Interval for cleanup of disconnected subscribers
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Hub sizing and backpressure options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubOptions {
    /// Lines kept for replay to new subscribers
    pub history_capacity: usize,
    /// Per-subscriber queue capacity
    pub queue_capacity: usize,
    /// Consecutive drops before a subscriber is disconnected (0 = never)
    pub max_consecutive_drops: u64,
    /// Maximum concurrent subscribers (0 = unlimited)
    pub max_subscribers: usize,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_consecutive_drops: DEFAULT_MAX_CONSECUTIVE_DROPS,
            max_subscribers: 0,
        }
    }
}

impl HubOptions {
    /// Set history capacity
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set per-subscriber queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the slow-subscriber threshold
    pub fn max_consecutive_drops(mut self, drops: u64) -> Self {
        self.max_consecutive_drops = drops;
        self
    }

    /// Set the subscriber cap
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers = max;
        self
    }
}

/// A registered subscriber's view of the hub
///
/// Yields the history replay first, then live lines. Lines ingested while
/// the replay is being consumed wait in the bounded live queue.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    replay: VecDeque<LogLine>,
    receiver: mpsc::Receiver<LogLine>,
    status: Arc<SubscriberStatus>,
}

impl Subscription {
    /// Get the subscriber ID
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Get the subscriber's state and counters
    #[inline]
    pub fn status(&self) -> &SubscriberStatus {
        &self.status
    }

    /// Replay lines not yet consumed
    #[inline]
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// Next line: replay first, then live
    ///
    /// Returns `None` once the subscriber has been unregistered (evicted,
    /// unsubscribed, or hub shut down) and its queue is drained.
    pub async fn recv(&mut self) -> Option<LogLine> {
        if let Some(line) = self.replay.pop_front() {
            return Some(line);
        }
        self.receiver.recv().await
    }

    /// Non-blocking variant of `recv`
    pub fn try_recv(&mut self) -> std::result::Result<LogLine, TryRecvError> {
        if let Some(line) = self.replay.pop_front() {
            return Ok(line);
        }
        self.receiver.try_recv()
    }
}

/// The broadcast hub
#[derive(Debug)]
pub struct BroadcastHub {
    /// Recent lines for replay
    history: HistoryBuffer,
    /// Subscriber registry
    subscribers: SubscriberRegistry,
    /// Per-subscriber queue capacity
    queue_capacity: usize,
    /// Serializes ingest (append + fan-out) against subscribe (register + snapshot)
    sequencer: Mutex<()>,
    /// Set once by shutdown
    closed: AtomicBool,
    /// Total lines ingested
    ingested: AtomicU64,
    /// Total lines queued to subscribers
    delivered: AtomicU64,
    /// Total lines dropped for full queues
    dropped: AtomicU64,
    /// Subscribers removed by the hub (slow or disconnected)
    evicted: AtomicU64,
    /// Bytes removed by UTF-8 repair
    repaired_bytes: AtomicU64,
}

impl BroadcastHub {
    /// Create a new hub with default options
    pub fn new() -> Self {
        Self::with_options(HubOptions::default())
    }

    /// Create a hub with the given options
    pub fn with_options(options: HubOptions) -> Self {
        Self {
            history: HistoryBuffer::with_capacity(options.history_capacity),
            subscribers: SubscriberRegistry::with_limits(
                options.max_subscribers,
                options.max_consecutive_drops,
            ),
            queue_capacity: options.queue_capacity.max(1),
            sequencer: Mutex::new(()),
            closed: AtomicBool::new(false),
            ingested: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            repaired_bytes: AtomicU64::new(0),
        }
    }

    /// Ingest one raw chunk from the producer
    ///
    /// The chunk is sanitized, appended to history and broadcast. Chunks that
    /// are empty after sanitizing are ignored, as is everything after
    /// shutdown. Never blocks on subscribers.
    pub fn ingest(&self, raw: &[u8]) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        let text = sanitize(raw);
        let repaired = raw.len() - text.len();
        if repaired > 0 {
            self.repaired_bytes
                .fetch_add(repaired as u64, Ordering::Relaxed);
            trace!(repaired, "dropped invalid UTF-8 from chunk");
        }

        if text.is_empty() {
            return;
        }

        let line = LogLine::new(text);

        let outcome = {
            let _guard = self.sequencer.lock();
            if self.closed.load(Ordering::Acquire) {
                return;
            }
            self.history.append(line.clone());
            self.subscribers.broadcast(&line)
        };

        self.ingested.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
        self.dropped
            .fetch_add(outcome.dropped as u64, Ordering::Relaxed);
        if outcome.evicted > 0 {
            self.evicted
                .fetch_add(outcome.evicted as u64, Ordering::Relaxed);
        }

        trace!(
            line = %line,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "ingested line"
        );
    }

    /// Subscribe to the hub
    ///
    /// The returned subscription holds the history snapshot taken at
    /// registration and receives every line ingested afterwards.
    pub fn subscribe(&self) -> Result<Subscription> {
        let (id, status, receiver, replay) = {
            let _guard = self.sequencer.lock();
            if self.closed.load(Ordering::Acquire) {
                return Err(HubError::ShuttingDown);
            }

            let (id, status, receiver) = self.subscribers.register(self.queue_capacity)?;
            let replay = self.history.snapshot();
            (id, status, receiver, replay)
        };

        debug!(
            subscriber_id = %id,
            replay = replay.len(),
            subscribers = self.subscribers.count(),
            "new subscriber"
        );

        Ok(Subscription {
            id,
            replay: replay.into(),
            receiver,
            status,
        })
    }

    /// Unsubscribe from the hub
    ///
    /// Idempotent: returns false if the ID was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.unregister(id);
        if removed {
            debug!(
                subscriber_id = %id,
                subscribers = self.subscribers.count(),
                "subscriber removed"
            );
        }
        removed
    }

    /// Shut the hub down
    ///
    /// Unregisters every subscriber and releases their endpoints before
    /// returning. Later subscribes fail and later ingests are ignored.
    /// Returns the number of subscribers released.
    pub fn shutdown(&self) -> usize {
        let _guard = self.sequencer.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let released = self.subscribers.drain();
        info!(released, "hub shut down");
        released
    }

    /// Check if the hub has been shut down
    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    /// Copy of the current history (oldest first)
    pub fn history(&self) -> Vec<LogLine> {
        self.history.snapshot()
    }

    /// Get hub statistics
    pub fn stats(&self) -> HubStats {
        HubStats {
            ingested: self.ingested.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            repaired_bytes: self.repaired_bytes.load(Ordering::Relaxed),
            subscriber_count: self.subscribers.count(),
            history_len: self.history.len(),
            history_capacity: self.history.capacity(),
        }
    }

    /// Clean up subscribers whose receiver was dropped
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup(&self) -> usize {
        let removed = self.subscribers.cleanup_disconnected();

        if removed > 0 {
            debug!(removed, "cleaned up disconnected subscribers");
        }

        removed
    }

    /// Spawn the maintenance task
    ///
    /// Runs `cleanup` every `interval` until `cancel` fires.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        hub.cleanup();
                    }
                }
            }
        })
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Total lines ingested
    pub ingested: u64,
    /// Total lines queued to subscribers
    pub delivered: u64,
    /// Total lines dropped for slow subscribers
    pub dropped: u64,
    /// Subscribers removed by the hub
    pub evicted: u64,
    /// Invalid bytes removed from producer chunks
    pub repaired_bytes: u64,
    /// Current number of subscribers
    pub subscriber_count: usize,
    /// Current history length
    pub history_len: usize,
    /// History capacity
    pub history_capacity: usize,
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
