//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use oplots_shared::types::{DocumentId, LotId};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Object read back from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage key.
    pub storage_key: String,
    /// Content type recorded by the backend, if it keeps one.
    pub content_type: Option<String>,
    /// Object contents.
    pub data: Bytes,
}

/// Storage service for lot document binaries.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("provider", &self.config.provider.name())
            .field("max_file_size", &self.config.max_file_size)
            .finish_non_exhaustive()
    }
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let config_err = |e: opendal::Error| StorageError::configuration(e.to_string());

        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map_err(config_err)?.finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder).map_err(config_err)?.finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );
                Operator::new(builder).map_err(config_err)?.finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(config_err)?
                .finish(),
        };

        Ok(operator)
    }

    /// Generate the storage key of one document version.
    ///
    /// Format: `{lot_id}/{document_id}/{version_key}`
    #[must_use]
    pub fn generate_storage_key(
        lot_id: LotId,
        document_id: DocumentId,
        version_key: &str,
    ) -> String {
        format!("{lot_id}/{document_id}/{version_key}")
    }

    /// Store the contents of a document version.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn write(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        self.operator
            .write_with(key, data)
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Read a stored document version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored under `key`.
    pub async fn read(&self, key: &str) -> Result<StoredObject, StorageError> {
        let meta = self.operator.stat(key).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::not_found(key),
            _ => StorageError::from(e),
        })?;
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;

        Ok(StoredObject {
            storage_key: key.to_string(),
            content_type: meta.content_type().map(String::from),
            data: buffer.to_bytes(),
        })
    }

    /// Re-record the content type of a stored object.
    ///
    /// Backends keep the content type as object metadata, so the object is
    /// rewritten with the new value. Backends without content type metadata
    /// (local filesystem) just get the same bytes back.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or cannot be rewritten.
    pub async fn update_content_type(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let object = self.read(key).await?;
        if object.content_type.as_deref() == Some(content_type) {
            return Ok(());
        }
        self.write(key, content_type, object.data).await
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Keys of every object stored under `prefix`.
    #[cfg(test)]
    pub(crate) async fn keys_under(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self
            .operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(StorageError::from)?;
        Ok(entries
            .into_iter()
            .filter(|e| e.metadata().mode().is_file())
            .map(|e| e.path().to_string())
            .collect())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize a filename for use in headers and storage paths.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn memory_service() -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create service")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("notice.pdf"), "notice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("паспорт.pdf"), "_______.pdf");
    }

    #[test]
    fn test_generate_storage_key() {
        let lot_id =
            LotId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap());
        let doc_id =
            DocumentId::from_uuid(Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap());

        let key = StorageService::generate_storage_key(lot_id, doc_id, "abc123");
        assert_eq!(
            key,
            "550e8400-e29b-41d4-a716-446655440000/6ba7b810-9dad-11d1-80b4-00c04fd430c8/abc123"
        );
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let service = memory_service();
        service
            .write("lot/doc/k1", "application/pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();

        let object = service.read("lot/doc/k1").await.unwrap();
        assert_eq!(object.data, Bytes::from_static(b"%PDF-1.4"));
        assert!(service.exists("lot/doc/k1").await);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let service = memory_service();
        let err = service.read("missing/key").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { ref key } if key == "missing/key"));
    }

    #[tokio::test]
    async fn test_update_content_type_keeps_bytes() {
        let service = memory_service();
        service
            .write("lot/doc/k2", "application/pdf", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        service
            .update_content_type("lot/doc/k2", "text/plain")
            .await
            .unwrap();

        let object = service.read("lot/doc/k2").await.unwrap();
        assert_eq!(object.data, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = memory_service();
        service
            .write("lot/doc/k3", "text/plain", Bytes::from_static(b"x"))
            .await
            .unwrap();
        service.delete("lot/doc/k3").await.unwrap();
        assert!(!service.exists("lot/doc/k3").await);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Sanitized filenames only contain header-safe characters.
    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);

            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
            prop_assert_eq!(sanitized.chars().count(), filename.chars().count());
        }
    }
}
