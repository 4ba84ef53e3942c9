//! Lot document error types.

use oplots_shared::AppError;
use oplots_shared::types::{DocumentId, LotId};
use thiserror::Error;

use crate::storage::StorageError;

/// Lot document operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Lot not found.
    #[error("lot not found: {0}")]
    LotNotFound(LotId),

    /// Document not found on the lot.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// No version with the requested download key.
    #[error("download not found: {0}")]
    DownloadNotFound(String),

    /// Operation needs credentials.
    #[error("authentication required")]
    Unauthenticated,

    /// Role lacks the permission.
    #[error("permission denied: {permission}")]
    PermissionDenied {
        /// Missing permission name.
        permission: &'static str,
    },

    /// A business rule forbids the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// Field not known to the document model.
    #[error("Rogue field: {0}")]
    RogueField(String),

    /// Lot was changed concurrently.
    #[error("lot {0} was modified concurrently")]
    Conflict(LotId),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl DocumentError {
    /// Create a rule violation error.
    #[must_use]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::LotNotFound(_) => Self::NotFound("Lot not found".to_string()),
            DocumentError::DocumentNotFound(_) | DocumentError::DownloadNotFound(_) => {
                Self::NotFound("Document not found".to_string())
            }
            DocumentError::Unauthenticated => {
                Self::Unauthorized("Authentication required".to_string())
            }
            DocumentError::PermissionDenied { permission } => {
                Self::Forbidden(format!("Missing permission: {permission}"))
            }
            DocumentError::Forbidden(msg) => Self::Forbidden(msg),
            DocumentError::Validation(msg) => Self::Validation(msg),
            err @ DocumentError::RogueField(_) => Self::Validation(err.to_string()),
            DocumentError::Conflict(_) => {
                Self::Conflict("Lot was modified concurrently, retry the request".to_string())
            }
            DocumentError::Storage(e @ StorageError::FileTooLarge { .. }) => {
                Self::PayloadTooLarge(e.to_string())
            }
            DocumentError::Storage(e @ StorageError::InvalidMimeType { .. }) => {
                Self::Validation(e.to_string())
            }
            DocumentError::Storage(e) => Self::Storage(e.to_string()),
            DocumentError::Repository(msg) => Self::Database(msg),
        }
    }
}
