//! Logcast Web - browser page and websocket transport
//!
//! Serves the log viewer page, its static assets, and a websocket endpoint
//! that streams hub lines to each connected browser.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logcast_hub::BroadcastHub;
//! use logcast_web::{AppState, serve};
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//!
//! let hub = Arc::new(BroadcastHub::new());
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! serve(listener, AppState::new(hub), CancellationToken::new()).await?;
//! ```

mod error;
pub mod routes;
pub mod state;

pub use error::{ErrorResponse, Result, WebError};
pub use routes::{LOGS_PATH, build_router};
pub use state::AppState;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serve the router on `listener` until `cancel` fires
///
/// Open websocket streams end when the hub releases their subscribers, so
/// shut the hub down after cancelling.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
}
