//! Reader Source - tails an `AsyncRead` line by line
//!
//! Used for `logcast serve --stdin`, e.g. `my-service 2>&1 | logcast serve --stdin`.
//! Bytes are handed to the hub without UTF-8 validation; the hub repairs them.

use std::sync::Arc;

use logcast_hub::BroadcastHub;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Stdin};
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::trim_line_end;

/// Read buffer size
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Line reader source
pub struct ReaderSource<R> {
    reader: R,
    hub: Arc<BroadcastHub>,
}

impl ReaderSource<Stdin> {
    /// Source reading the process's standard input
    pub fn stdin(hub: Arc<BroadcastHub>) -> Self {
        Self::new(tokio::io::stdin(), hub)
    }
}

impl<R: AsyncRead + Unpin> ReaderSource<R> {
    /// Create a source over any reader
    pub fn new(reader: R, hub: Arc<BroadcastHub>) -> Self {
        Self { reader, hub }
    }

    /// Read until EOF or cancellation
    ///
    /// Returns the number of lines read. A final line without a terminator is
    /// still ingested.
    pub async fn run(self, cancel: CancellationToken) -> Result<u64, SourceError> {
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, self.reader);
        let mut buf = Vec::with_capacity(1024);
        let mut lines = 0u64;

        loop {
            buf.clear();

            let read = tokio::select! {
                _ = cancel.cancelled() => break,
                read = reader.read_until(b'\n', &mut buf) => read?,
            };

            // EOF
            if read == 0 {
                break;
            }

            self.hub.ingest(trim_line_end(&buf));
            lines += 1;
        }

        tracing::info!(lines, "reader source stopped");
        Ok(lines)
    }
}
