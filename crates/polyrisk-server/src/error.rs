//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use polyrisk_runtime::PipelineError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug, Clone, Serialize, Error)]
#[error("[{status}] [{kind}] {message}")]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,

    /// Human-readable message
    #[serde(rename = "error")]
    pub message: String,

    /// Machine-checkable error kind
    pub kind: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, kind)
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, kind)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let kind = err.kind().as_str();
        if err.is_client_error() {
            Self::bad_request(err.to_string(), kind)
        } else {
            Self::internal(err.to_string(), kind)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
