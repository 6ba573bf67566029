//! Error types for the HTTP surface.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::WorkflowError;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or rejected input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown or evicted run.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anything that indicates a bug in the executor.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        if e.is_internal() {
            return ApiError::Internal(e.to_string());
        }
        match e {
            WorkflowError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            WorkflowError::RunNotFound(id) => ApiError::NotFound(format!("run {} not found", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "run_not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = self.to_string();

        match &self {
            ApiError::Internal(_) => error!("Server error ({}): {}", status, message),
            _ => warn!("Client error ({}): {}", status, message),
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
