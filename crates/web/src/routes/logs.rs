//! WebSocket log stream
//!
//! Each connection subscribes to the hub, receives the history replay and
//! then every new line as one text message. The server pings every
//! heartbeat interval. Whatever ends the connection, the subscriber is
//! unregistered before the task exits.

use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use axum::routing::get;
use logcast_hub::{HubError, Subscription};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::routes::LOGS_PATH;
use crate::state::AppState;

/// Why a websocket stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    /// Client sent a close frame or went away
    ClientClosed,
    /// Writing to the socket failed
    SendFailed,
    /// Reading from the socket failed
    ReceiveFailed,
    /// Hub released the subscriber (evicted or shutting down)
    Released,
}

/// Log stream routes
pub fn routes() -> Router<AppState> {
    Router::new().route(LOGS_PATH, get(logs_handler))
}

async fn logs_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_logs(socket, state))
}

async fn stream_logs(mut socket: WebSocket, state: AppState) {
    let mut subscription = match state.hub.subscribe() {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "rejecting websocket subscriber");
            let code = match e {
                HubError::MaxSubscribers { .. } => close_code::AGAIN,
                HubError::ShuttingDown => close_code::AWAY,
            };
            let _ = socket.send(close(code, &e.to_string())).await;
            return;
        }
    };

    let id = subscription.id();
    info!(
        subscriber_id = %id,
        replay = subscription.pending_replay(),
        "websocket connected"
    );

    let reason = pump(&mut socket, &mut subscription, state.heartbeat_interval).await;
    state.hub.unsubscribe(id);

    info!(
        subscriber_id = %id,
        reason = ?reason,
        delivered = subscription.status().delivered(),
        dropped = subscription.status().dropped(),
        "websocket disconnected"
    );
}

/// Move lines from the subscription to the socket until either side ends
async fn pump(
    socket: &mut WebSocket,
    subscription: &mut Subscription,
    heartbeat_interval: Duration,
) -> Disconnect {
    let mut heartbeat =
        tokio::time::interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = subscription.recv() => match line {
                Some(line) => {
                    if socket.send(Message::Text(line.as_str().into())).await.is_err() {
                        return Disconnect::SendFailed;
                    }
                }
                None => {
                    let _ = socket.send(close(close_code::AWAY, "stream closed")).await;
                    return Disconnect::Released;
                }
            },
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                    return Disconnect::SendFailed;
                }
            }
            incoming = socket.recv() => match incoming {
                None | Some(Ok(Message::Close(_))) => return Disconnect::ClientClosed,
                Some(Err(e)) => {
                    debug!(error = %e, "websocket receive error");
                    return Disconnect::ReceiveFailed;
                }
                // Pongs and client messages are ignored
                Some(Ok(_)) => {}
            },
        }
    }
}

fn close(code: u16, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}
