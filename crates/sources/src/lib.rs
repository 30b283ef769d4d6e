//! Logcast Sources
//!
//! Producers that feed raw log chunks into a `BroadcastHub`.
//!
//! # Available Sources
//!
//! - **Docker** - Follows the logs of one running container through the
//!   Docker API, re-selecting a container when the stream ends
//! - **Reader** - Tails any `AsyncRead` (stdin in production) line by line
//!
//! Sources own reconnection. The hub only ever sees `ingest` calls.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logcast_hub::BroadcastHub;
//! use logcast_sources::{DockerSource, DockerSourceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let hub = Arc::new(BroadcastHub::new());
//! let source = DockerSource::new(DockerSourceConfig::default(), Arc::clone(&hub));
//! source.run(CancellationToken::new()).await?;
//! ```

pub mod docker;
mod error;
pub mod reader;

pub use docker::{DockerEndpoint, DockerSource, DockerSourceConfig, select_container};
pub use error::SourceError;
pub use reader::ReaderSource;

/// Strip one trailing line terminator (`\n` or `\r\n`)
pub fn trim_line_end(chunk: &[u8]) -> &[u8] {
    match chunk.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => chunk,
    }
}

/// Split a chunk that may carry several lines
///
/// Terminators are removed. A trailing terminator does not produce an extra
/// empty line.
pub fn split_lines(chunk: &[u8]) -> impl Iterator<Item = &[u8]> {
    trim_line_end(chunk)
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}
