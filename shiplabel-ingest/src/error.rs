//! Error types for the HTTP surface
//!
//! Pipeline errors keep their own enums; [`ApiError`] maps them onto status
//! codes and the JSON error body `{"error": {"code", "message"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ImportError, MaintenanceError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Conflict (409): duplicate import, maintenance already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload decoded badly or held no usable address (422)
    #[error("Unprocessable ({code}): {message}")]
    Unprocessable { code: &'static str, message: String },

    /// Store unavailable or timed out (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Decode(message) => ApiError::Unprocessable {
                code: "DECODE_FAILED",
                message,
            },
            // Reason codes stay in the logs
            ImportError::Extraction(_) => ApiError::Unprocessable {
                code: "ADDRESS_NOT_FOUND",
                message: "Address not found".to_string(),
            },
            ImportError::DuplicateConflict { .. } => ApiError::Conflict(err.to_string()),
            ImportError::Store(message) => ApiError::Unavailable(message),
            ImportError::Cancelled => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl From<MaintenanceError> for ApiError {
    fn from(err: MaintenanceError) -> Self {
        match err {
            MaintenanceError::AlreadyRunning => ApiError::Conflict(err.to_string()),
            MaintenanceError::Store(_) | MaintenanceError::DeleteFailed { .. } => {
                ApiError::Unavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
