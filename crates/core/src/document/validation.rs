//! Validator chains for lot document operations.
//!
//! Each operation runs an ordered list of plain validator functions over a
//! [`ValidationContext`]. The first failure short-circuits the chain, so
//! request shape errors are reported before business rule violations.

use chrono::{DateTime, Utc};

use super::error::DocumentError;
use super::patch::DocumentPatch;
use super::permission::AuthenticatedRole;
use super::types::{Document, DocumentMetadata, DocumentOf, DocumentType, FileUpload};
use crate::lot::Lot;
use crate::storage::StorageConfig;

/// Mutating operation on the documents resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOperation {
    /// New document (`POST`).
    Create,
    /// New version of an existing document (`PUT`).
    Replace,
    /// Metadata change of the current version (`PATCH`).
    Update,
}

impl DocumentOperation {
    /// Verb used in status rule messages.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "add",
            Self::Replace | Self::Update => "update",
        }
    }

    /// Validator chain of this operation, in execution order.
    #[must_use]
    pub fn validators(&self) -> &'static [DocumentValidator] {
        match self {
            Self::Create => POST_VALIDATORS,
            Self::Replace => PUT_VALIDATORS,
            Self::Update => PATCH_VALIDATORS,
        }
    }
}

/// Everything a validator may look at.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Operation being validated.
    pub operation: DocumentOperation,
    /// Lot as loaded for this request.
    pub lot: &'a Lot,
    /// Caller's role relative to the lot.
    pub role: AuthenticatedRole,
    /// Current version of the addressed document (`PUT`/`PATCH`).
    pub target: Option<&'a Document>,
    /// Uploaded file (`POST`/`PUT`).
    pub upload: Option<&'a FileUpload>,
    /// Metadata sent with the upload (`POST`/`PUT`).
    pub metadata: Option<&'a DocumentMetadata>,
    /// Parsed patch (`PATCH`).
    pub patch: Option<&'a DocumentPatch>,
    /// Upload limits.
    pub storage: &'a StorageConfig,
    /// Request time.
    pub now: DateTime<Utc>,
}

/// A single validation step.
pub type DocumentValidator = fn(&ValidationContext<'_>) -> Result<(), DocumentError>;

/// Validators run before a document is created.
pub const POST_VALIDATORS: &[DocumentValidator] = &[
    validate_file_upload,
    validate_document_operation_in_not_allowed_lot_status,
    rectification_period_document_validation,
];

/// Validators run before a new version is appended.
pub const PUT_VALIDATORS: &[DocumentValidator] = &[
    validate_document_data,
    validate_document_operation_in_not_allowed_lot_status,
    validate_lot_document_update_not_by_author_or_lot_owner,
    rectification_period_document_validation,
];

/// Validators run before the current version is patched.
pub const PATCH_VALIDATORS: &[DocumentValidator] = &[
    validate_patch_document_data,
    validate_document_operation_in_not_allowed_lot_status,
    validate_lot_document_update_not_by_author_or_lot_owner,
    rectification_period_document_validation,
];

/// Run the operation's chain against `ctx`.
///
/// # Errors
///
/// Returns the first validator failure.
pub fn run_validators(ctx: &ValidationContext<'_>) -> Result<(), DocumentError> {
    for validator in ctx.operation.validators() {
        validator(ctx)?;
    }
    Ok(())
}

/// The upload carries a usable file and valid metadata.
///
/// # Errors
///
/// `Validation` for a missing or malformed file, `Storage` for limit
/// violations.
pub fn validate_file_upload(ctx: &ValidationContext<'_>) -> Result<(), DocumentError> {
    check_file(ctx)?;

    let metadata = ctx.metadata.cloned().unwrap_or_default();
    if let Some(title) = &metadata.title {
        check_title(title)?;
    }
    check_related_item(
        metadata.document_of.unwrap_or_default(),
        metadata.related_item.as_deref(),
    )
}

/// A new version carries a usable file, and the metadata it inherits from
/// the current version stays consistent.
///
/// # Errors
///
/// Same failures as [`validate_file_upload`].
pub fn validate_document_data(ctx: &ValidationContext<'_>) -> Result<(), DocumentError> {
    check_file(ctx)?;

    let target = target(ctx)?;
    let metadata = ctx.metadata.cloned().unwrap_or_default();
    if let Some(title) = &metadata.title {
        check_title(title)?;
    }
    let related_item = metadata.related_item.or_else(|| target.related_item.clone());
    check_related_item(
        metadata.document_of.unwrap_or(target.document_of),
        related_item.as_deref(),
    )
}

/// The patched document would still be valid.
///
/// # Errors
///
/// `Validation` when the patch is missing or leaves the document invalid.
pub fn validate_patch_document_data(ctx: &ValidationContext<'_>) -> Result<(), DocumentError> {
    let patch = ctx
        .patch
        .ok_or_else(|| DocumentError::validation("Data not available"))?;

    let mut preview = target(ctx)?.clone();
    patch.apply(&mut preview);

    check_title(&preview.title)?;
    if preview.format.trim().is_empty() {
        return Err(DocumentError::validation("format: This field is required."));
    }
    ctx.storage.validate_mime_type(&preview.format)?;
    check_related_item(preview.document_of, preview.related_item.as_deref())
}

/// The lot is in a status that allows document changes.
///
/// # Errors
///
/// `Forbidden` naming the current status.
pub fn validate_document_operation_in_not_allowed_lot_status(
    ctx: &ValidationContext<'_>,
) -> Result<(), DocumentError> {
    if ctx.lot.status.allows_document_changes() {
        return Ok(());
    }
    Err(DocumentError::forbidden(format!(
        "Can't {} document in current ({}) lot status",
        ctx.operation.verb(),
        ctx.lot.status
    )))
}

/// Only the author of a document may change it.
///
/// Documents without a recorded author belong to the lot owner.
///
/// # Errors
///
/// `Forbidden` for every other role.
pub fn validate_lot_document_update_not_by_author_or_lot_owner(
    ctx: &ValidationContext<'_>,
) -> Result<(), DocumentError> {
    let author = target(ctx)?.author.unwrap_or(AuthenticatedRole::LotOwner);
    if ctx.role == author {
        return Ok(());
    }
    Err(DocumentError::forbidden("Can update document only author"))
}

/// Once the rectification period is over, only cancellation details may be
/// added and existing documents are frozen.
///
/// # Errors
///
/// `Forbidden` after the period's end.
pub fn rectification_period_document_validation(
    ctx: &ValidationContext<'_>,
) -> Result<(), DocumentError> {
    if !ctx.lot.rectification_period_ended(ctx.now) {
        return Ok(());
    }

    match ctx.operation {
        DocumentOperation::Create => {
            let document_type = ctx.metadata.and_then(|m| m.document_type);
            if document_type == Some(DocumentType::CancellationDetails) {
                Ok(())
            } else {
                Err(DocumentError::forbidden(
                    "You can add only document with cancellationDetails after rectificationPeriod",
                ))
            }
        }
        DocumentOperation::Replace | DocumentOperation::Update => Err(DocumentError::forbidden(
            "You can't change documents after rectification period",
        )),
    }
}

fn target<'a>(ctx: &ValidationContext<'a>) -> Result<&'a Document, DocumentError> {
    ctx.target
        .ok_or_else(|| DocumentError::validation("Document not available"))
}

fn check_file(ctx: &ValidationContext<'_>) -> Result<(), DocumentError> {
    let upload = ctx
        .upload
        .ok_or_else(|| DocumentError::validation("file: This field is required."))?;

    if upload.filename.trim().is_empty() {
        return Err(DocumentError::validation("file: Filename is required."));
    }
    if upload.content_type.trim().is_empty() {
        return Err(DocumentError::validation("file: Content type is required."));
    }

    ctx.storage
        .validate_upload(&upload.content_type, upload.size())?;
    Ok(())
}

fn check_title(title: &str) -> Result<(), DocumentError> {
    if title.trim().is_empty() {
        return Err(DocumentError::validation("title: String value is too short."));
    }
    Ok(())
}

fn check_related_item(
    document_of: DocumentOf,
    related_item: Option<&str>,
) -> Result<(), DocumentError> {
    if document_of == DocumentOf::Item && related_item.is_none_or(|id| id.trim().is_empty()) {
        return Err(DocumentError::validation(
            "relatedItem: This field is required.",
        ));
    }
    Ok(())
}
