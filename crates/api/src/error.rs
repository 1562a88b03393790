use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{AssetError, GameError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Capacity too low: {0}")]
    CapacityTooLow(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure envelope shared by every endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    message: String,
}

impl ApiError {
    /// Machine-readable code sent in the `error` field.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidTime(_) => "invalid_time",
            ApiError::CapacityTooLow(_) => "capacity_too_low",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_code = self.error_code();
        let (status, message) = match self {
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidTime(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::CapacityTooLow(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Validation(msg) => ApiError::Validation(msg),
            GameError::InvalidTime => ApiError::InvalidTime(err.to_string()),
            GameError::CapacityTooLow => ApiError::CapacityTooLow(err.to_string()),
            GameError::Conflict | GameError::GameFull | GameError::AlreadyRegistered => {
                ApiError::Conflict(err.to_string())
            }
            GameError::CourtNotFound | GameError::GameNotFound => {
                ApiError::NotFound(err.to_string())
            }
            GameError::NotFound(msg) => ApiError::NotFound(msg),
            GameError::Asset(AssetError::InvalidImage(msg)) => {
                ApiError::Validation(format!("Thumbnail is not a valid image: {}", msg))
            }
            GameError::Asset(AssetError::NotFound(msg)) => ApiError::NotFound(msg),
            GameError::Asset(AssetError::Unavailable(_))
            | GameError::InsertFailed(_)
            | GameError::StorageUnavailable(_)
            | GameError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::Validation(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}
