//! Operations routes
//!
//! Health check and hub statistics for monitoring.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use logcast_hub::HubStats;
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server status
    pub status: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Operations routes (health, stats)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.hub.is_shut_down() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status,
        uptime_secs: state.uptime_secs(),
    })
}

async fn stats_handler(State(state): State<AppState>) -> Json<HubStats> {
    Json(state.hub.stats())
}
