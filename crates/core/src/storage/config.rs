//! Storage configuration types.

use oplots_shared::config::StorageSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory; contents vanish with the process.
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Build a provider from the flat settings of the application config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider name or when a
    /// field the provider needs is missing.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        fn required(value: Option<&String>, field: &str) -> Result<String, StorageError> {
            value
                .cloned()
                .ok_or_else(|| StorageError::configuration(format!("storage.{field} is required")))
        }

        match settings.provider.as_str() {
            "local" => Ok(Self::local_fs(&settings.root)),
            "memory" => Ok(Self::Memory),
            "s3" => Ok(Self::S3 {
                endpoint: required(settings.endpoint.as_ref(), "endpoint")?,
                bucket: required(settings.bucket.as_ref(), "bucket")?,
                access_key_id: required(settings.access_key_id.as_ref(), "access_key_id")?,
                secret_access_key: required(
                    settings.secret_access_key.as_ref(),
                    "secret_access_key",
                )?,
                region: settings
                    .region
                    .clone()
                    .unwrap_or_else(|| "auto".to_string()),
            }),
            "azure_blob" => Ok(Self::AzureBlob {
                account: required(settings.account.as_ref(), "account")?,
                access_key: required(settings.access_key.as_ref(), "access_key")?,
                container: required(settings.bucket.as_ref(), "bucket")?,
            }),
            other => Err(StorageError::configuration(format!(
                "unknown storage provider '{other}'"
            ))),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 50MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Build the storage config from application settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider settings are incomplete.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let mut config =
            Self::new(StorageProvider::from_settings(settings)?).with_max_file_size(settings.max_file_size);
        if let Some(types) = &settings.allowed_mime_types {
            config = config.with_allowed_mime_types(types.clone());
        }
        Ok(config)
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set allowed MIME types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Default allowed MIME types for lot documents.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            // Documents
            "application/pdf".to_string(),
            "application/msword".to_string(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
            "application/vnd.ms-excel".to_string(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            "application/zip".to_string(),
            "text/plain".to_string(),
            "text/csv".to_string(),
            // Images
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/webp".to_string(),
        ]
    }

    /// Check an upload's content type and size against the limits.
    ///
    /// # Errors
    ///
    /// `FileTooLarge` above `max_file_size`, `InvalidMimeType` outside the
    /// allowed list.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.max_file_size {
            return Err(StorageError::file_too_large(size, self.max_file_size));
        }
        self.validate_mime_type(content_type)
    }

    /// Check a content type against the allowed list.
    ///
    /// # Errors
    ///
    /// `InvalidMimeType` outside the allowed list.
    pub fn validate_mime_type(&self, content_type: &str) -> Result<(), StorageError> {
        if self.is_mime_type_allowed(content_type) {
            Ok(())
        } else {
            Err(StorageError::invalid_mime_type(content_type))
        }
    }

    /// Check if a MIME type is allowed.
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // File size validation accepts exactly the sizes within the limit.
    proptest! {
        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 0u64..20_000_000,
        ) {
            let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(max_size);

            let result = config.validate_upload("application/pdf", file_size);

            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                let is_too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(is_too_large);
            }
        }
    }
}
