use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ValidationResult;
use crate::repository::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{}", .0.message)]
    LicenseInvalid(ValidationResult),

    #[error("{}", .0.message)]
    LicenseExpired(ValidationResult),

    #[error("{}", .0.message)]
    LicenseRevoked(ValidationResult),

    #[error("Usage limit exceeded for {0}")]
    UsageLimitExceeded(String),

    #[error("Invalid usage value for {0}")]
    InvalidUsageValue(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The validation result carried by license rejections, if any.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        match self {
            AppError::LicenseInvalid(r) | AppError::LicenseExpired(r) | AppError::LicenseRevoked(r) => {
                Some(r)
            }
            _ => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Resource not found".into()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Cancelled => AppError::Cancelled,
            StoreError::Json(e) => AppError::Storage(format!("Stored JSON is malformed: {}", e)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::LicenseInvalid(result)
            | AppError::LicenseExpired(result)
            | AppError::LicenseRevoked(result) => {
                return (StatusCode::FORBIDDEN, Json(result)).into_response();
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "Invalid input", Some(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg)),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg)),
            AppError::UsageLimitExceeded(metric) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Usage limit exceeded",
                Some(metric),
            ),
            AppError::InvalidUsageValue(metric) => (
                StatusCode::BAD_REQUEST,
                "Invalid usage value",
                Some(metric),
            ),
            AppError::Cancelled => (StatusCode::REQUEST_TIMEOUT, "Request cancelled", None),
            AppError::Json(e) => (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string())),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
