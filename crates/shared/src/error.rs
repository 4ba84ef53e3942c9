//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant maps to one HTTP status and one stable error code that the
/// API puts in the `error` field of its error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// No or invalid credentials.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller lacks the permission or a rule forbids the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request (unreadable body, bad multipart).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Concurrent modification detected.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payload exceeds configured limits.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Object storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Validation(_) => 422,
            Self::Conflict(_) => 409,
            Self::PayloadTooLarge(_) => 413,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Database(_) => "database_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to API clients.
    ///
    /// Server-side failures are reduced to a generic message; their detail
    /// belongs in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                "An error occurred".to_string()
            }
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::PayloadTooLarge(msg) => msg.clone(),
        }
    }

    /// Whether this error represents a server-side failure.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
