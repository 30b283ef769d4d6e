//! Tail command - Print a running server's log stream
//!
//! Connects to the `/logs` websocket and writes every line to stdout, so
//! the output can be piped into grep or a file. Connection messages go to
//! stderr.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing_subscriber::EnvFilter;

/// Tail command arguments
#[derive(Args, Debug)]
pub struct TailArgs {
    /// Websocket URL of the server's log stream
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/logs")]
    pub url: String,

    /// Exit after printing N lines (history replay included)
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<u64>,

    /// Quiet mode (suppress connection messages)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the tail command
pub async fn run(args: TailArgs, log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None if args.quiet => EnvFilter::new("error"),
        None => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    tracing::info!(url = %args.url, "connecting to server");

    let (mut socket, _response) = connect_async(args.url.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", args.url))?;

    tracing::info!("connected, streaming lines (Ctrl+C to stop)");

    let stdout = io::stdout();
    let mut printed = 0u64;

    loop {
        if args.limit.is_some_and(|limit| printed >= limit) {
            break;
        }

        tokio::select! {
            message = socket.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let mut out = stdout.lock();
                        if !write_line(&mut out, text.as_str())? {
                            // Reader went away (e.g. `| head`)
                            break;
                        }
                        printed += 1;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(reason = %describe_close(frame.as_ref()), "server closed the stream");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Pings are answered by the protocol layer
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "receive error");
                        break;
                    }
                    None => {
                        tracing::info!("connection closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }
    }

    let _ = socket.close(None).await;
    tracing::debug!(printed, "tail finished");

    Ok(())
}

/// Write one line, returning false once stdout's reader is gone
fn write_line(out: &mut impl Write, text: &str) -> Result<bool> {
    match writeln!(out, "{}", text).and_then(|()| out.flush()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(e) => Err(e).context("failed to write to stdout"),
    }
}

/// Human readable close reason
fn describe_close(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if frame.reason.as_str().is_empty() => format!("code {}", u16::from(frame.code)),
        Some(frame) => format!("code {}: {}", u16::from(frame.code), frame.reason.as_str()),
        None => "no close frame".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    #[test]
    fn test_write_line_appends_newline() {
        let mut out = Vec::new();
        assert!(write_line(&mut out, "hello").unwrap());
        assert!(write_line(&mut out, "world").unwrap());
        assert_eq!(out, b"hello\nworld\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_line_stops_on_broken_pipe() {
        assert!(!write_line(&mut BrokenPipe, "lost").unwrap());
    }

    #[test]
    fn test_describe_close() {
        assert_eq!(describe_close(None), "no close frame");

        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "server shutting down".into(),
        };
        assert_eq!(describe_close(Some(&frame)), "code 1001: server shutting down");

        let frame = CloseFrame {
            code: CloseCode::Again,
            reason: "".into(),
        };
        assert_eq!(describe_close(Some(&frame)), "code 1013");
    }
}
