//! OpLots API Server
//!
//! Main entry point for the lot documents service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oplots_api::{AppState, create_router};
use oplots_core::document::ResourceUrls;
use oplots_core::storage::{StorageConfig, StorageService};
use oplots_db::connect;
use oplots_shared::{AppConfig, JwtConfig, JwtService};

/// Prefix the API routes are nested under.
const API_PREFIX: &str = "/api/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oplots=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    };
    let jwt_service = JwtService::new(jwt_config);

    let storage_config = StorageConfig::from_settings(&config.storage)?;
    let storage = StorageService::from_config(storage_config)?;
    info!(
        provider = storage.provider_name(),
        max_file_size = storage.config().max_file_size,
        "Storage configured"
    );

    let urls = ResourceUrls::new(format!(
        "{}{API_PREFIX}",
        config.api.public_url.trim_end_matches('/')
    ));

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
        urls,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
