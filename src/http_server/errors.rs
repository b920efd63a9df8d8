//! # HTTP Errors
//!
//! Maps service failures onto status codes and a JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::service::ServiceError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP layer errors
#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Body is not valid JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Path segment could not be parsed
    #[error("Invalid path parameter: {0}")]
    InvalidParam(String),

    // ==================
    // Service Errors
    // ==================
    #[error("{0}")]
    Service(#[from] ServiceError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                // 400 Bad Request
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::FieldNotIndexed(_) => StatusCode::BAD_REQUEST,
                ServiceError::UnknownType(_) => StatusCode::BAD_REQUEST,

                // 404 Not Found
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,

                // 500 Internal Server Error
                ServiceError::BackendUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
