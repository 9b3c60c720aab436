//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::ConfigError;
use docket_core::error::HistoryError;
use docket_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the versioning core.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request payload or parameters were malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller did not identify itself (missing or malformed `x-user-id`).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but not allowed to perform this write.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource does not exist for this caller. Also used when read
    /// access is denied, so unreadable documents are indistinguishable
    /// from absent ones.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    /// Converts the error into an HTTP response with a JSON body of the
    /// shape `{"error": {"code": ..., "message": ...}}`.
    ///
    /// Internal failures (database, IO, storage) are logged with their real
    /// cause and returned to the client with a generic message.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Config(ref e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::History(HistoryError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", msg)
            }
            ApiError::History(HistoryError::InvalidArgument(msg)) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", msg)
            }
            ApiError::History(HistoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "conflict", msg)
            }
            ApiError::History(HistoryError::Storage(ref msg)) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Port(PortError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", msg)
            }
            ApiError::Port(PortError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "conflict", msg)
            }
            ApiError::Port(PortError::Unexpected(ref msg)) => {
                tracing::error!("Port error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            ApiError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "An IO error occurred".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_expected_statuses() {
        let cases = [
            (
                ApiError::from(HistoryError::NotFound("missing".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(HistoryError::InvalidArgument("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(HistoryError::Conflict("taken".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(HistoryError::Storage("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(PortError::NotFound("missing".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(PortError::Conflict("taken".into())),
                StatusCode::CONFLICT,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn shell_errors_map_to_expected_statuses() {
        let cases = [
            (
                ApiError::BadRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("who are you".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Forbidden("read only".into()),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
