use anyhow::{Context, Result};
use pictura_core::Config;
use pictura_storage::{create_blob_store, BlobStore};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn BlobStore>> {
    let store = create_blob_store(config)
        .await
        .context("Failed to initialize blob store")?;

    tracing::info!(
        backend = %store.backend_type(),
        bucket = ?config.gcs_bucket(),
        "Blob store initialized"
    );

    Ok(store)
}
