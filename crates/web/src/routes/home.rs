//! Home page
//!
//! Serves `{templates_path}/dlogs.html`. The template is read on every
//! request so edits show up without a restart.

use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;

use crate::error::{Result, WebError};
use crate::routes::LOGS_PATH;
use crate::state::AppState;

/// Template file name inside the templates directory
pub const TEMPLATE_NAME: &str = "dlogs.html";

/// Placeholder replaced with the websocket path
pub const LOGS_PATH_PLACEHOLDER: &str = "{{logs_path}}";

/// Home routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(home_handler))
}

async fn home_handler(State(state): State<AppState>) -> Result<Html<String>> {
    let path = state.templates_path.join(TEMPLATE_NAME);

    let template = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| WebError::Template {
            path: path.display().to_string(),
            source,
        })?;

    Ok(Html(render(&template)))
}

/// Fill in the template placeholders
pub fn render(template: &str) -> String {
    template.replace(LOGS_PATH_PLACEHOLDER, LOGS_PATH)
}
