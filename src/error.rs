//! Error taxonomy shared by the repository, pipeline, and HTTP layers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// The orchestration core's error type.
///
/// Repository and pipeline code returns this directly; HTTP handlers convert
/// it into a response via `IntoResponse`. `TransitionSkipped` is not
/// propagated as an error at all — callers that skip a transition just log
/// at debug and return the current state.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound("row not found".to_string())
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                AppError::Transient(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, correlation_id) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token".to_string(),
                None,
            ),
            AppError::Transient(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone(), None),
            AppError::Internal(msg) => {
                let correlation_id = uuid::Uuid::new_v4().to_string();
                tracing::error!(correlation_id, error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    Some(correlation_id),
                )
            }
        };

        let body = match correlation_id {
            Some(cid) => json!({ "error": message, "correlationId": cid }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
