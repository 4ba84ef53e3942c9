//! Document types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use oplots_shared::types::{DocumentId, LotId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::DocumentError;
use super::permission::AuthenticatedRole;

/// Document type classification for loki lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Lot notice.
    #[serde(rename = "notice")]
    Notice,
    /// Technical specifications of the asset.
    #[serde(rename = "technicalSpecifications")]
    TechnicalSpecifications,
    /// Photos and drawings.
    #[serde(rename = "illustration")]
    Illustration,
    /// Presentation of the asset.
    #[serde(rename = "x_presentation")]
    Presentation,
    /// Information message about the lot.
    #[serde(rename = "informationDetails")]
    InformationDetails,
    /// Grounds for cancelling the lot.
    #[serde(rename = "cancellationDetails")]
    CancellationDetails,
    /// Asset familiarization procedure.
    #[serde(rename = "x_dgfAssetFamiliarization")]
    AssetFamiliarization,
    /// Public asset certificate.
    #[serde(rename = "x_dgfPublicAssetCertificate")]
    PublicAssetCertificate,
    /// Legal details of the platform.
    #[serde(rename = "x_dgfPlatformLegalDetails")]
    PlatformLegalDetails,
    /// Draft sale contract.
    #[serde(rename = "contractProforma")]
    ContractProforma,
}

impl DocumentType {
    /// Convert to wire/database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::TechnicalSpecifications => "technicalSpecifications",
            Self::Illustration => "illustration",
            Self::Presentation => "x_presentation",
            Self::InformationDetails => "informationDetails",
            Self::CancellationDetails => "cancellationDetails",
            Self::AssetFamiliarization => "x_dgfAssetFamiliarization",
            Self::PublicAssetCertificate => "x_dgfPublicAssetCertificate",
            Self::PlatformLegalDetails => "x_dgfPlatformLegalDetails",
            Self::ContractProforma => "contractProforma",
        }
    }

    /// Parse from wire/database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "notice" => Some(Self::Notice),
            "technicalSpecifications" => Some(Self::TechnicalSpecifications),
            "illustration" => Some(Self::Illustration),
            "x_presentation" => Some(Self::Presentation),
            "informationDetails" => Some(Self::InformationDetails),
            "cancellationDetails" => Some(Self::CancellationDetails),
            "x_dgfAssetFamiliarization" => Some(Self::AssetFamiliarization),
            "x_dgfPublicAssetCertificate" => Some(Self::PublicAssetCertificate),
            "x_dgfPlatformLegalDetails" => Some(Self::PlatformLegalDetails),
            "contractProforma" => Some(Self::ContractProforma),
            _ => None,
        }
    }
}

/// What a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOf {
    /// The lot as a whole.
    #[default]
    Lot,
    /// One item of the lot, named by `relatedItem`.
    Item,
}

impl DocumentOf {
    /// Convert to wire/database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lot => "lot",
            Self::Item => "item",
        }
    }

    /// Parse from wire/database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lot" => Some(Self::Lot),
            "item" => Some(Self::Item),
            _ => None,
        }
    }
}

/// One stored version of a lot document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Logical document ID, shared by all versions.
    pub id: DocumentId,
    /// Version key, unique per upload.
    pub key: String,
    /// Download URL of this version.
    pub url: String,
    /// Title (defaults to the uploaded filename).
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// MIME type of the file.
    pub format: String,
    /// Document type classification.
    pub document_type: Option<DocumentType>,
    /// What the document describes.
    pub document_of: DocumentOf,
    /// Item ID when `document_of` is `Item`.
    pub related_item: Option<String>,
    /// Language code.
    pub language: Option<String>,
    /// Role that uploaded the document.
    pub author: Option<AuthenticatedRole>,
    /// Content hash, `sha256:<hex>`.
    pub hash: String,
    /// Object storage key of the binary.
    pub storage_key: String,
    /// First publication of the logical document.
    pub date_published: DateTime<Utc>,
    /// Last change of this version.
    pub date_modified: DateTime<Utc>,
}

impl Document {
    /// Serialize with the public `view` role.
    #[must_use]
    pub fn view(&self) -> DocumentView {
        DocumentView {
            id: self.id,
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            format: self.format.clone(),
            document_type: self.document_type,
            document_of: self.document_of,
            related_item: self.related_item.clone(),
            language: self.language.clone(),
            author: self.author,
            hash: self.hash.clone(),
            date_published: self.date_published,
            date_modified: self.date_modified,
        }
    }
}

/// Public representation of a document version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    /// Logical document ID.
    pub id: DocumentId,
    /// Download URL.
    pub url: String,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type.
    pub format: String,
    /// Document type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    /// What the document describes.
    pub document_of: DocumentOf,
    /// Related item ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_item: Option<String>,
    /// Language code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Uploading role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthenticatedRole>,
    /// Content hash.
    pub hash: String,
    /// First publication (RFC 3339).
    pub date_published: DateTime<Utc>,
    /// Last change (RFC 3339).
    pub date_modified: DateTime<Utc>,
}

/// Current version of a document together with its other revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithVersions {
    /// Current version.
    #[serde(flatten)]
    pub document: DocumentView,
    /// Every other version, oldest first.
    pub previous_versions: Vec<DocumentView>,
}

/// Uploaded binary.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-side filename.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl FileUpload {
    /// Size of the upload in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Content hash in `sha256:<hex>` form.
    #[must_use]
    pub fn hash(&self) -> String {
        format!("sha256:{:x}", Sha256::digest(&self.data))
    }
}

/// Multipart body of an upload: the file part plus every text part, in
/// the order received.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    /// The `file` part.
    pub file: Option<FileUpload>,
    /// Text parts as `(name, value)`.
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// Form carrying just `file`.
    #[must_use]
    pub fn new(file: Option<FileUpload>) -> Self {
        Self {
            file,
            fields: Vec::new(),
        }
    }

    /// Add a text part.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Metadata sent alongside an upload.
///
/// Every field is optional; missing values fall back to the filename (title),
/// the previous version (on replace), or the model defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Title override.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Document type.
    pub document_type: Option<DocumentType>,
    /// What the document describes.
    pub document_of: Option<DocumentOf>,
    /// Related item ID.
    pub related_item: Option<String>,
    /// Language code.
    pub language: Option<String>,
}

impl DocumentMetadata {
    /// Build metadata from multipart text fields.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::RogueField` for an unknown field and
    /// `DocumentError::Validation` for an unknown enum value.
    pub fn from_form_fields<I, K, V>(fields: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut metadata = Self::default();
        for (name, value) in fields {
            let value: String = value.into();
            match name.as_ref() {
                "title" => metadata.title = Some(value),
                "description" => metadata.description = Some(value),
                "documentType" => {
                    metadata.document_type = Some(DocumentType::parse(&value).ok_or_else(|| {
                        DocumentError::validation(format!(
                            "documentType: Value must be one of the document types, got '{value}'"
                        ))
                    })?);
                }
                "documentOf" => {
                    metadata.document_of = Some(DocumentOf::parse(&value).ok_or_else(|| {
                        DocumentError::validation(format!(
                            "documentOf: Value must be one of ['lot', 'item'], got '{value}'"
                        ))
                    })?);
                }
                "relatedItem" => metadata.related_item = Some(value),
                "language" => metadata.language = Some(value),
                other => return Err(DocumentError::RogueField(other.to_string())),
            }
        }
        Ok(metadata)
    }
}

/// Builds the public URLs of the lot documents resource.
#[derive(Debug, Clone)]
pub struct ResourceUrls {
    base: String,
}

impl ResourceUrls {
    /// `base` is the externally visible API root, e.g. `https://host/api/v1`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Item URL of a document, used for the `Location` header.
    #[must_use]
    pub fn document(&self, lot_id: LotId, document_id: DocumentId) -> String {
        format!("{}/lots/{lot_id}/documents/{document_id}", self.base)
    }

    /// Download URL of one version.
    #[must_use]
    pub fn download(&self, lot_id: LotId, document_id: DocumentId, key: &str) -> String {
        format!("{}?download={key}", self.document(lot_id, document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_roundtrip() {
        let types = [
            DocumentType::Notice,
            DocumentType::TechnicalSpecifications,
            DocumentType::Illustration,
            DocumentType::Presentation,
            DocumentType::InformationDetails,
            DocumentType::CancellationDetails,
            DocumentType::AssetFamiliarization,
            DocumentType::PublicAssetCertificate,
            DocumentType::PlatformLegalDetails,
            DocumentType::ContractProforma,
        ];

        for t in types {
            assert_eq!(DocumentType::parse(t.as_str()), Some(t));
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                serde_json::Value::from(t.as_str())
            );
        }
    }

    #[test]
    fn test_document_type_unknown() {
        assert_eq!(DocumentType::parse("biddingDocuments"), None);
    }

    #[test]
    fn test_upload_hash() {
        let upload = FileUpload {
            filename: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            data: Bytes::from_static(b"abc"),
        };
        assert_eq!(
            upload.hash(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(upload.size(), 3);
    }

    #[test]
    fn test_metadata_from_form_fields() {
        let metadata = DocumentMetadata::from_form_fields([
            ("title", "Notice"),
            ("documentType", "notice"),
            ("documentOf", "item"),
            ("relatedItem", "0a1b"),
        ])
        .unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Notice"));
        assert_eq!(metadata.document_type, Some(DocumentType::Notice));
        assert_eq!(metadata.document_of, Some(DocumentOf::Item));
        assert_eq!(metadata.related_item.as_deref(), Some("0a1b"));
    }

    #[test]
    fn test_metadata_rejects_rogue_field() {
        let err = DocumentMetadata::from_form_fields([("owner", "x")]).unwrap_err();
        assert!(matches!(err, DocumentError::RogueField(ref f) if f == "owner"));
    }

    #[test]
    fn test_metadata_rejects_unknown_type() {
        let err = DocumentMetadata::from_form_fields([("documentType", "nope")]).unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
    }

    #[test]
    fn test_resource_urls() {
        let urls = ResourceUrls::new("http://localhost:8080/api/v1/");
        let lot_id = LotId::new();
        let doc_id = DocumentId::new();

        assert_eq!(
            urls.document(lot_id, doc_id),
            format!("http://localhost:8080/api/v1/lots/{lot_id}/documents/{doc_id}")
        );
        assert!(urls.download(lot_id, doc_id, "k1").ends_with("?download=k1"));
    }

    #[test]
    fn test_view_skips_empty_optionals() {
        let now = Utc::now();
        let doc = Document {
            id: DocumentId::new(),
            key: "k".to_string(),
            url: "u".to_string(),
            title: "t.pdf".to_string(),
            description: None,
            format: "application/pdf".to_string(),
            document_type: None,
            document_of: DocumentOf::Lot,
            related_item: None,
            language: None,
            author: Some(AuthenticatedRole::LotOwner),
            hash: "sha256:00".to_string(),
            storage_key: "secret/key".to_string(),
            date_published: now,
            date_modified: now,
        };

        let json = serde_json::to_value(doc.view()).unwrap();
        assert_eq!(json["documentOf"], "lot");
        assert_eq!(json["author"], "lot_owner");
        assert!(json.get("description").is_none());
        assert!(json.get("storageKey").is_none());
        assert!(json.get("key").is_none());
    }
}
