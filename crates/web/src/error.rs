//! Web error types
//!
//! Handler errors are logged and turned into JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Web handler errors
#[derive(Debug, Error)]
pub enum WebError {
    /// Page template could not be read
    #[error("failed to read template '{path}': {source}")]
    Template {
        /// Path that was tried
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl WebError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Template { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Template { .. } => "TEMPLATE_ERROR",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        tracing::error!(
            error_code = body.error,
            error_message = %body.message,
            status = %status,
            "request failed"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for web handlers
pub type Result<T> = std::result::Result<T, WebError>;
