//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use pictura_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        auth_enabled = config.auth().enabled,
        "Configuration loaded and validated successfully"
    );

    let store = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, store).await?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
