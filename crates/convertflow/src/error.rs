//! Unified error type for the conversion service.
//!
//! Every handler returns `Result<T, ConvertError>`; the `IntoResponse` impl
//! turns a failure into a JSON `{message}` body with the matching status
//! code. Internal errors are logged with full detail but only a generic
//! message reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The caller sent something it can fix: bad URL, wrong extension,
    /// missing file field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote source has no usable data or format for this request.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Unknown job id, or the recorded artifact no longer exists on disk.
    #[error("not found: {0}")]
    NotFound(String),

    /// Download requested before the job reached `completed`.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Unexpected converter or I/O failure. Never shown to the caller
    /// verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        ConvertError::Internal(format!("I/O error: {e}"))
    }
}

impl From<reqwest::Error> for ConvertError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL from the message so internal storage layout and
        // upstream query parameters stay out of job records.
        ConvertError::Upstream(format!("transfer failed: {}", e.without_url()))
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ConvertError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ConvertError::NotReady(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ConvertError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ConvertError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            ConvertError::Internal(m) => {
                error!(message = %m, "internal conversion error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "conversion failed".to_owned(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
