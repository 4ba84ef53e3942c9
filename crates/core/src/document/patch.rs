//! Partial document updates.
//!
//! A patch is parsed from the JSON `data` object of a PATCH request and
//! applied field by field; only values that differ from the current version
//! count as changes.

use serde_json::{Map, Value};

use super::error::DocumentError;
use super::types::{Document, DocumentOf, DocumentType};

/// Fields clients may send but never change.
const READ_ONLY_FIELDS: [&str; 6] = ["id", "url", "author", "hash", "datePublished", "dateModified"];

/// Parsed metadata patch.
///
/// `None` means the field was absent. For nullable fields `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New MIME type.
    pub format: Option<String>,
    /// New document type.
    pub document_type: Option<Option<DocumentType>>,
    /// New subject.
    pub document_of: Option<DocumentOf>,
    /// New related item.
    pub related_item: Option<Option<String>>,
    /// New language.
    pub language: Option<Option<String>>,
}

impl DocumentPatch {
    /// Parse a patch from the request's `data` object.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-object payload or mistyped values, and
    /// `RogueField` for keys the document model does not know.
    pub fn from_value(data: &Value) -> Result<Self, DocumentError> {
        let Value::Object(fields) = data else {
            return Err(DocumentError::validation("Data not available"));
        };
        Self::from_map(fields)
    }

    fn from_map(fields: &Map<String, Value>) -> Result<Self, DocumentError> {
        let mut patch = Self::default();

        for (name, value) in fields {
            match name.as_str() {
                "title" => patch.title = Some(required_string(name, value)?),
                "description" => patch.description = Some(nullable_string(name, value)?),
                "format" => patch.format = Some(required_string(name, value)?),
                "documentType" => {
                    patch.document_type = Some(
                        nullable_string(name, value)?
                            .map(|s| {
                                DocumentType::parse(&s).ok_or_else(|| {
                                    DocumentError::validation(format!(
                                        "documentType: Value must be one of the document types, got '{s}'"
                                    ))
                                })
                            })
                            .transpose()?,
                    );
                }
                "documentOf" => {
                    let s = required_string(name, value)?;
                    patch.document_of = Some(DocumentOf::parse(&s).ok_or_else(|| {
                        DocumentError::validation(format!(
                            "documentOf: Value must be one of ['lot', 'item'], got '{s}'"
                        ))
                    })?);
                }
                "relatedItem" => patch.related_item = Some(nullable_string(name, value)?),
                "language" => patch.language = Some(nullable_string(name, value)?),
                ro if READ_ONLY_FIELDS.contains(&ro) => {}
                other => return Err(DocumentError::RogueField(other.to_string())),
            }
        }

        Ok(patch)
    }

    /// Apply the patch in place, returning the names of fields that changed.
    pub fn apply(&self, document: &mut Document) -> Vec<&'static str> {
        let mut changed = Vec::new();

        set_if_changed(&mut document.title, self.title.as_ref(), "title", &mut changed);
        set_if_changed(
            &mut document.description,
            self.description.as_ref(),
            "description",
            &mut changed,
        );
        set_if_changed(&mut document.format, self.format.as_ref(), "format", &mut changed);
        set_if_changed(
            &mut document.document_type,
            self.document_type.as_ref(),
            "documentType",
            &mut changed,
        );
        set_if_changed(
            &mut document.document_of,
            self.document_of.as_ref(),
            "documentOf",
            &mut changed,
        );
        set_if_changed(
            &mut document.related_item,
            self.related_item.as_ref(),
            "relatedItem",
            &mut changed,
        );
        set_if_changed(
            &mut document.language,
            self.language.as_ref(),
            "language",
            &mut changed,
        );

        changed
    }
}

fn set_if_changed<T: Clone + PartialEq>(
    slot: &mut T,
    new: Option<&T>,
    name: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if let Some(new) = new
        && slot != new
    {
        *slot = new.clone();
        changed.push(name);
    }
}

fn required_string(name: &str, value: &Value) -> Result<String, DocumentError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DocumentError::validation(format!("{name}: Couldn't interpret value as string.")))
}

fn nullable_string(name: &str, value: &Value) -> Result<Option<String>, DocumentError> {
    if value.is_null() {
        return Ok(None);
    }
    required_string(name, value).map(Some)
}
