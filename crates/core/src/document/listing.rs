//! Collection views over a lot's document versions.

use super::types::Document;

/// Every version, in insertion order.
#[must_use]
pub fn all_versions(documents: &[Document]) -> Vec<&Document> {
    documents.iter().collect()
}

/// One entry per logical document, the last inserted version winning,
/// sorted by `date_modified` ascending.
///
/// Ties keep the position where the id first appeared.
#[must_use]
pub fn latest_versions(documents: &[Document]) -> Vec<&Document> {
    let mut latest: Vec<&Document> = Vec::new();
    for document in documents {
        match latest.iter_mut().find(|d| d.id == document.id) {
            Some(slot) => *slot = document,
            None => latest.push(document),
        }
    }
    latest.sort_by_key(|d| d.date_modified);
    latest
}

/// Versions of `current`'s document other than `current` itself.
#[must_use]
pub fn previous_versions<'a>(documents: &'a [Document], current: &Document) -> Vec<&'a Document> {
    documents
        .iter()
        .filter(|d| d.id == current.id && d.url != current.url)
        .collect()
}
