//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::config::ConfigError;
use veridoc_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a malformed request shape (bad multipart, missing field).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents a failure while rendering the PDF report.
    #[error("Report rendering error: {0}")]
    Render(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    /// Format and validation errors are surfaced to the caller with
    /// descriptive detail; everything else logs the detail server-side and
    /// answers with a generic message.
    fn into_response(self) -> Response {
        match self {
            ApiError::Port(PortError::UnsupportedFormat(mime)) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported file type: {mime}"),
            )
                .into_response(),
            ApiError::Validation(detail) => {
                (StatusCode::BAD_REQUEST, detail).into_response()
            }
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
            }
            ApiError::Port(PortError::NotFound(detail)) => {
                (StatusCode::NOT_FOUND, detail).into_response()
            }
            other => {
                error!("internal error: {other:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred while processing the request.".to_string(),
                )
                    .into_response()
            }
        }
    }
}
