//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Public API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Object storage configuration.
///
/// `provider` selects which of the remaining fields are read:
/// `local` uses `root`, `s3` uses the endpoint/bucket/credential fields,
/// `azure_blob` uses account/access key/container, `memory` uses none.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// One of `local`, `memory`, `s3`, `azure_blob`.
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// Root directory for the local provider.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// S3 endpoint URL.
    pub endpoint: Option<String>,
    /// S3 bucket or Azure container.
    pub bucket: Option<String>,
    /// S3 region.
    pub region: Option<String>,
    /// S3 access key ID.
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    pub secret_access_key: Option<String>,
    /// Azure storage account name.
    pub account: Option<String>,
    /// Azure storage access key.
    pub access_key: Option<String>,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types; the built-in list is used when unset.
    pub allowed_mime_types: Option<Vec<String>>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            root: default_storage_root(),
            endpoint: None,
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            account: None,
            access_key: None,
            max_file_size: default_max_file_size(),
            allowed_mime_types: None,
        }
    }
}

fn default_storage_provider() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

/// Public API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Externally visible base URL, used for `Location` headers and document URLs.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
        }
    }
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("OPLOTS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
