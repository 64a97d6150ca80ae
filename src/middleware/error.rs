use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced by the session routes.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Cookie mutation could not be expressed as a response header.
    #[error("Cookie storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Session internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
    }
}
