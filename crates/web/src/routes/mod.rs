//! HTTP routes
//!
//! - `/` page rendered from the template directory
//! - `/static/*` static assets
//! - `/logs` websocket log stream
//! - `/health`, `/stats` operations endpoints

pub mod home;
pub mod logs;
pub mod ops;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Path of the websocket endpoint
pub const LOGS_PATH: &str = "/logs";

/// Build the complete router
pub fn build_router(state: AppState) -> Router {
    // `/static/js/main.js` resolves to `{static_dir}/static/js/main.js`
    let static_files = ServeDir::new(state.static_dir.join("static"));

    Router::new()
        .merge(home::routes())
        .merge(logs::routes())
        .merge(ops::routes())
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
