//! Lot documents resource.
//!
//! Versioned binary documents attached to a lot:
//! - Listing (latest version per document, or every version)
//! - Upload of new documents
//! - Read with previous versions, raw download by version key
//! - New versions (`PUT`) and metadata patches (`PATCH`)
//!
//! Every mutation runs the operation's validator chain, appends to or edits
//! the lot's document list, and saves the lot as a whole.

mod error;
mod listing;
mod patch;
mod permission;
mod service;
mod types;
mod validation;

pub use error::DocumentError;
pub use listing::{all_versions, latest_versions, previous_versions};
pub use patch::DocumentPatch;
pub use permission::{AuthenticatedRole, Permission, check_permission};
pub use service::{CreatedDocument, DocumentChange, DocumentDownload, LotDocumentService};
pub use types::{
    Document, DocumentMetadata, DocumentOf, DocumentType, DocumentView, DocumentWithVersions,
    FileUpload, ResourceUrls, UploadForm,
};
pub use validation::{
    DocumentOperation, DocumentValidator, PATCH_VALIDATORS, POST_VALIDATORS, PUT_VALIDATORS,
    ValidationContext, run_validators,
};
