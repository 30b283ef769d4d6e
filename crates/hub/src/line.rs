//! Immutable log line shared between the history buffer and subscribers

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::sanitize::sanitize;

/// One ingested, sanitized unit of log output
///
/// Cloning is a reference count bump, so the history buffer and every
/// subscriber queue share the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogLine(Arc<str>);

impl LogLine {
    /// Create a line from text that is already valid
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Create a line from a raw producer chunk, repairing invalid UTF-8
    pub fn from_chunk(raw: &[u8]) -> Self {
        Self(Arc::from(sanitize(raw)))
    }

    /// Get the payload
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for LogLine {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LogLine {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LogLine {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
