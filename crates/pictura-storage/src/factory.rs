#[cfg(feature = "storage-gcs")]
use crate::GcsBlobStore;
#[cfg(feature = "storage-local")]
use crate::LocalBlobStore;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use pictura_core::Config;
use std::sync::Arc;

/// Create a blob store based on configuration
pub async fn create_blob_store(config: &Config) -> StorageResult<Arc<dyn BlobStore>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let bucket = config
                .gcs_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("GCS_BUCKET not configured".to_string()))?;

            let storage = GcsBlobStore::new(bucket)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => Err(StorageError::ConfigError(
            "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalBlobStore::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use pictura_core::AppConfig;

    #[tokio::test]
    async fn test_create_local_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from(AppConfig {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(dir.path().display().to_string()),
            local_storage_base_url: Some("http://localhost:8080/files".to_string()),
            ..AppConfig::default()
        });

        let store = create_blob_store(&config).await.unwrap();
        assert_eq!(store.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_gcs_requires_bucket() {
        let config = Config::from(AppConfig {
            storage_backend: StorageBackend::Gcs,
            gcs_bucket: None,
            ..AppConfig::default()
        });

        let result = create_blob_store(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
