//! Typed API error for HTTP handlers.
//!
//! Handlers return `Result<Json<T>, ApiError>`; the engine's three error
//! kinds map onto 400/404/500 here and nowhere else. Internal failures are
//! logged server-side and replaced with a static message so database
//! detail never leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engram_core::EngramError;

#[derive(Debug)]
pub enum ApiError {
    /// 400 — invalid input from the caller.
    BadRequest(String),
    /// 404 — no live row matches.
    NotFound(String),
    /// 500 — storage failure. Details logged, not exposed.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            },
        };
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<EngramError> for ApiError {
    fn from(err: EngramError) -> Self {
        match err {
            EngramError::Validation(msg) => Self::BadRequest(msg),
            EngramError::NotFound(msg) => Self::NotFound(msg),
            EngramError::Storage { .. } => Self::Internal(err.to_string()),
        }
    }
}
