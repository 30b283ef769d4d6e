//! Ring buffer for log history
//!
//! The `HistoryBuffer` stores the most recent lines in a fixed-size ring.
//! When a new subscriber connects it receives a snapshot of the buffer before
//! the live stream, so it sees context instead of only future lines.
//!
//! Eviction is strict FIFO: once the ring is full, every append overwrites
//! the oldest slot.

use parking_lot::RwLock;

use crate::line::LogLine;

/// Default number of lines kept for replay
pub const DEFAULT_CAPACITY: usize = 250;

/// Maximum capacity to prevent memory issues
pub const MAX_CAPACITY: usize = 100_000;

/// Ring buffer of the most recent log lines
#[derive(Debug)]
pub struct HistoryBuffer {
    /// Internal storage
    inner: RwLock<HistoryBufferInner>,
}

#[derive(Debug)]
struct HistoryBufferInner {
    /// The ring buffer
    buffer: Vec<Option<LogLine>>,
    /// Current write position
    write_pos: usize,
    /// Total lines ever appended
    total_appended: u64,
    /// Capacity
    capacity: usize,
}

impl HistoryBufferInner {
    /// Number of lines currently held
    fn len(&self) -> usize {
        self.total_appended.min(self.capacity as u64) as usize
    }
}

impl HistoryBuffer {
    /// Create a new history buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a history buffer with specified capacity
    ///
    /// A capacity of zero keeps no history at all.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_CAPACITY);
        Self {
            inner: RwLock::new(HistoryBufferInner {
                buffer: vec![None; capacity],
                write_pos: 0,
                total_appended: 0,
                capacity,
            }),
        }
    }

    /// Append a line, evicting the oldest one when full
    pub fn append(&self, line: LogLine) {
        let mut inner = self.inner.write();
        inner.total_appended += 1;

        if inner.capacity == 0 {
            return;
        }

        let pos = inner.write_pos;
        inner.buffer[pos] = Some(line);
        inner.write_pos = (pos + 1) % inner.capacity;
    }

    /// Copy out the current contents (oldest first)
    ///
    /// The returned vector is detached from the buffer; later appends do not
    /// affect it.
    pub fn snapshot(&self) -> Vec<LogLine> {
        let inner = self.inner.read();
        let len = inner.len();

        if len == 0 {
            return Vec::new();
        }

        // Until the ring wraps the oldest line sits at slot 0, afterwards
        // it is the slot about to be overwritten
        let start = if len == inner.capacity {
            inner.write_pos
        } else {
            0
        };

        let mut result = Vec::with_capacity(len);
        for i in 0..len {
            let pos = (start + i) % inner.capacity;
            if let Some(ref line) = inner.buffer[pos] {
                result.push(line.clone());
            }
        }

        result
    }

    /// Get the total number of lines appended
    pub fn total_appended(&self) -> u64 {
        self.inner.read().total_appended
    }

    /// Get the current fill level
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
