//! Lot document service implementation.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use oplots_shared::Principal;
use oplots_shared::types::{DocumentId, LotId};
use serde_json::Value;
use uuid::Uuid;

use super::error::DocumentError;
use super::listing::{all_versions, latest_versions, previous_versions};
use super::patch::DocumentPatch;
use super::permission::{AuthenticatedRole, Permission, check_permission};
use super::types::{
    Document, DocumentMetadata, DocumentView, DocumentWithVersions, ResourceUrls, UploadForm,
};
use super::validation::{DocumentOperation, ValidationContext, run_validators};
use crate::lot::{Lot, LotRepository};
use crate::storage::{StorageService, sanitize_filename};

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct CreatedDocument {
    /// Serialized new document.
    pub document: DocumentView,
    /// Item URL of the new document.
    pub location: String,
    /// Role recorded as the author.
    pub role: AuthenticatedRole,
}

/// Result of a `PUT` or `PATCH`.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    /// Serialized current version.
    pub document: DocumentView,
    /// Caller's role.
    pub role: AuthenticatedRole,
    /// Whether the lot was saved. A patch without effective changes is not.
    pub saved: bool,
}

/// Raw contents of one document version.
#[derive(Debug, Clone)]
pub struct DocumentDownload {
    /// Filename safe for a `Content-Disposition` header.
    pub filename: String,
    /// Document format.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// Lot documents resource: list, upload, read, download, replace and patch.
pub struct LotDocumentService<R: LotRepository> {
    storage: Arc<StorageService>,
    repo: Arc<R>,
    urls: ResourceUrls,
}

impl<R: LotRepository> LotDocumentService<R> {
    /// Create a new lot document service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, repo: Arc<R>, urls: ResourceUrls) -> Self {
        Self {
            storage,
            repo,
            urls,
        }
    }

    /// List the documents of a lot.
    ///
    /// With `all` every version is returned in insertion order, otherwise
    /// only the latest version of each document, oldest change first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lot does not exist.
    pub async fn list(
        &self,
        principal: &Principal,
        lot_id: LotId,
        all: bool,
    ) -> Result<Vec<DocumentView>, DocumentError> {
        let (lot, _) = self.authorize(principal, lot_id, Permission::ViewLot).await?;

        let documents = if all {
            all_versions(&lot.documents)
        } else {
            latest_versions(&lot.documents)
        };
        Ok(documents.into_iter().map(Document::view).collect())
    }

    /// Upload a new document to a lot.
    ///
    /// The file is stored first; if the lot cannot be saved the stored file
    /// is removed again.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lot does not exist
    /// - The caller may not upload documents
    /// - A validator rejects the upload
    /// - Storage or persistence fails
    pub async fn upload(
        &self,
        principal: &Principal,
        lot_id: LotId,
        form: UploadForm,
    ) -> Result<CreatedDocument, DocumentError> {
        let (mut lot, role) = self
            .authorize(principal, lot_id, Permission::UploadLotDocuments)
            .await?;
        let metadata = DocumentMetadata::from_form_fields(form.fields)?;
        let upload = form.file;
        let now = Utc::now();

        run_validators(&ValidationContext {
            operation: DocumentOperation::Create,
            lot: &lot,
            role,
            target: None,
            upload: upload.as_ref(),
            metadata: Some(&metadata),
            patch: None,
            storage: self.storage.config(),
            now,
        })?;
        let upload = upload.ok_or_else(|| DocumentError::validation("file: This field is required."))?;

        let document_id = DocumentId::new();
        let key = new_version_key();
        let storage_key = StorageService::generate_storage_key(lot.id, document_id, &key);
        let document = Document {
            id: document_id,
            url: self.urls.download(lot.id, document_id, &key),
            key,
            title: metadata.title.unwrap_or_else(|| upload.filename.clone()),
            description: metadata.description,
            format: upload.content_type.clone(),
            document_type: metadata.document_type,
            document_of: metadata.document_of.unwrap_or_default(),
            related_item: metadata.related_item,
            language: metadata.language,
            author: Some(role),
            hash: upload.hash(),
            storage_key,
            date_published: now,
            date_modified: now,
        };

        self.storage
            .write(&document.storage_key, &upload.content_type, upload.data)
            .await?;
        lot.documents.push(document.clone());
        self.save_or_discard(&lot, &document.storage_key).await?;

        Ok(CreatedDocument {
            location: self.urls.document(lot.id, document_id),
            document: document.view(),
            role,
        })
    }

    /// Read the current version of a document with its earlier versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the lot or document does not exist.
    pub async fn get(
        &self,
        principal: &Principal,
        lot_id: LotId,
        document_id: DocumentId,
    ) -> Result<DocumentWithVersions, DocumentError> {
        let (lot, _) = self.authorize(principal, lot_id, Permission::ViewLot).await?;

        let current = lot
            .latest_version(document_id)
            .ok_or(DocumentError::DocumentNotFound(document_id))?;

        Ok(DocumentWithVersions {
            document: current.view(),
            previous_versions: previous_versions(&lot.documents, current)
                .into_iter()
                .map(Document::view)
                .collect(),
        })
    }

    /// Fetch the binary of the version with download key `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lot, document, version or stored file is
    /// missing.
    pub async fn download(
        &self,
        principal: &Principal,
        lot_id: LotId,
        document_id: DocumentId,
        key: &str,
    ) -> Result<DocumentDownload, DocumentError> {
        let (lot, _) = self.authorize(principal, lot_id, Permission::ViewLot).await?;

        let versions = lot.versions_of(document_id);
        if versions.is_empty() {
            return Err(DocumentError::DocumentNotFound(document_id));
        }
        let version = versions
            .into_iter()
            .find(|d| d.key == key)
            .ok_or_else(|| DocumentError::DownloadNotFound(key.to_string()))?;

        let object = self.storage.read(&version.storage_key).await?;

        Ok(DocumentDownload {
            filename: sanitize_filename(&version.title),
            content_type: version.format.clone(),
            data: object.data,
        })
    }

    /// Append a new version of an existing document.
    ///
    /// Metadata not sent with the upload is carried over from the current
    /// version; the title falls back to the uploaded filename.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lot or document does not exist
    /// - The caller may not change the document
    /// - A validator rejects the upload
    /// - Storage or persistence fails
    pub async fn replace(
        &self,
        principal: &Principal,
        lot_id: LotId,
        document_id: DocumentId,
        form: UploadForm,
    ) -> Result<DocumentChange, DocumentError> {
        let (mut lot, role) = self
            .authorize(principal, lot_id, Permission::UploadLotDocuments)
            .await?;
        let current = lot
            .latest_version(document_id)
            .cloned()
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        let metadata = DocumentMetadata::from_form_fields(form.fields)?;
        let upload = form.file;
        let now = Utc::now();

        run_validators(&ValidationContext {
            operation: DocumentOperation::Replace,
            lot: &lot,
            role,
            target: Some(&current),
            upload: upload.as_ref(),
            metadata: Some(&metadata),
            patch: None,
            storage: self.storage.config(),
            now,
        })?;
        let upload = upload.ok_or_else(|| DocumentError::validation("file: This field is required."))?;

        let key = new_version_key();
        let storage_key = StorageService::generate_storage_key(lot.id, document_id, &key);
        let document = Document {
            id: document_id,
            url: self.urls.download(lot.id, document_id, &key),
            key,
            title: metadata.title.unwrap_or_else(|| upload.filename.clone()),
            description: metadata.description.or(current.description),
            format: upload.content_type.clone(),
            document_type: metadata.document_type.or(current.document_type),
            document_of: metadata.document_of.unwrap_or(current.document_of),
            related_item: metadata.related_item.or(current.related_item),
            language: metadata.language.or(current.language),
            author: current.author,
            hash: upload.hash(),
            storage_key,
            date_published: current.date_published,
            date_modified: now,
        };

        self.storage
            .write(&document.storage_key, &upload.content_type, upload.data)
            .await?;
        lot.documents.push(document.clone());
        self.save_or_discard(&lot, &document.storage_key).await?;

        Ok(DocumentChange {
            document: document.view(),
            role,
            saved: true,
        })
    }

    /// Patch the metadata of the current version in place.
    ///
    /// `data` is the JSON object sent by the client. When nothing changes the
    /// lot is not saved. A changed `format` is propagated to the stored file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lot or document does not exist
    /// - The caller may not change the document
    /// - The patch is malformed or a validator rejects it
    /// - Storage or persistence fails
    pub async fn patch(
        &self,
        principal: &Principal,
        lot_id: LotId,
        document_id: DocumentId,
        data: &Value,
    ) -> Result<DocumentChange, DocumentError> {
        let (mut lot, role) = self
            .authorize(principal, lot_id, Permission::UploadLotDocuments)
            .await?;
        let current = lot
            .latest_version(document_id)
            .cloned()
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        let patch = DocumentPatch::from_value(data)?;
        let now = Utc::now();

        run_validators(&ValidationContext {
            operation: DocumentOperation::Update,
            lot: &lot,
            role,
            target: Some(&current),
            upload: None,
            metadata: None,
            patch: Some(&patch),
            storage: self.storage.config(),
            now,
        })?;

        let document = lot
            .latest_version_mut(document_id)
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        let changed = patch.apply(document);
        if changed.is_empty() {
            return Ok(DocumentChange {
                document: document.view(),
                role,
                saved: false,
            });
        }
        document.date_modified = now;
        let updated = document.clone();

        self.repo.save_lot(&lot).await?;
        // Downloads serve `format`; the stored object's content type is advisory.
        if changed.contains(&"format")
            && let Err(err) = self
                .storage
                .update_content_type(&updated.storage_key, &updated.format)
                .await
        {
            tracing::warn!(
                error = %err,
                lot_id = %lot_id,
                document_id = %document_id,
                storage_key = %updated.storage_key,
                "Failed to update stored content type"
            );
        }

        Ok(DocumentChange {
            document: updated.view(),
            role,
            saved: true,
        })
    }

    async fn authorize(
        &self,
        principal: &Principal,
        lot_id: LotId,
        permission: Permission,
    ) -> Result<(Lot, AuthenticatedRole), DocumentError> {
        let lot = self
            .repo
            .find_by_id(lot_id)
            .await?
            .ok_or(DocumentError::LotNotFound(lot_id))?;
        let role = AuthenticatedRole::resolve(principal, &lot);
        check_permission(role, permission)?;
        Ok((lot, role))
    }

    async fn save_or_discard(&self, lot: &Lot, storage_key: &str) -> Result<Lot, DocumentError> {
        match self.repo.save_lot(lot).await {
            Ok(saved) => Ok(saved),
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(storage_key).await {
                    tracing::warn!(
                        error = %cleanup,
                        lot_id = %lot.id,
                        storage_key,
                        "Failed to remove file of unsaved document version"
                    );
                }
                Err(err)
            }
        }
    }
}

fn new_version_key() -> String {
    Uuid::new_v4().simple().to_string()
}
