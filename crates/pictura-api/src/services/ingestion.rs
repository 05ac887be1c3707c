//! Upload ingestion and retrieval
//!
//! An upload moves through validate -> store -> caption -> persist. Caption
//! problems never stop the pipeline: they are recorded in the metadata like
//! a successful caption would be. Store and persist failures do.

use crate::services::metadata::{MetadataKeys, MetadataWriter};
use crate::utils::filename::secure_filename;
use crate::validation::{UploadPolicy, ValidationError};
use bytes::Bytes;
use pictura_core::{CaptionResult, ImageDetails, StorageBackend};
use pictura_services::CaptionGenerator;
use pictura_storage::{BlobStore, StorageError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Upload rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Failed to store image '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to persist metadata for '{key}': {source}")]
    Persist {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to read metadata for '{key}': {source}")]
    Retrieve {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to list images: {0}")]
    List(#[source] StorageError),
}

/// What one successful ingestion produced.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionOutcome {
    pub image_key: String,
    pub public_url: String,
    pub caption: CaptionResult,
    pub metadata: MetadataKeys,
}

pub struct IngestionPipeline {
    store: Arc<dyn BlobStore>,
    captioner: Arc<CaptionGenerator>,
    metadata: MetadataWriter,
    policy: UploadPolicy,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        captioner: Arc<CaptionGenerator>,
        metadata: MetadataWriter,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            store,
            captioner,
            metadata,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.store.backend_type()
    }

    /// Validate, store, caption and persist one upload.
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn ingest(
        &self,
        filename: &str,
        data: Bytes,
    ) -> Result<IngestionOutcome, IngestionError> {
        let start = Instant::now();

        self.policy.check_filename(filename)?;
        let image_key = secure_filename(filename);
        if !self.policy.allows(&image_key) {
            return Err(ValidationError::ExtensionNotAllowed(filename.to_string()).into());
        }
        self.policy.check_size(data.len())?;

        let public_url = self
            .store
            .put(&image_key, data.clone(), IMAGE_CONTENT_TYPE)
            .await
            .map_err(|source| IngestionError::Store {
                key: image_key.clone(),
                source,
            })?;
        tracing::debug!(image_key = %image_key, public_url = %public_url, "Image stored");

        let caption = self.captioner.generate(&image_key, data).await;

        let metadata = self
            .metadata
            .write(&image_key, &caption)
            .await
            .map_err(|source| IngestionError::Persist {
                key: image_key.clone(),
                source,
            })?;

        tracing::info!(
            image_key = %image_key,
            caption_status = %caption.status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image ingested"
        );

        Ok(IngestionOutcome {
            image_key,
            public_url,
            caption,
            metadata,
        })
    }

    /// Stored title and description for `filename`. Never calls the
    /// captioning service.
    pub async fn image_details(&self, filename: &str) -> Result<ImageDetails, IngestionError> {
        self.metadata
            .read(filename)
            .await
            .map_err(|source| IngestionError::Retrieve {
                key: filename.to_string(),
                source,
            })
    }

    /// Image keys in the bucket, sidecars excluded, sorted.
    pub async fn list_images(&self) -> Result<Vec<String>, IngestionError> {
        let mut images: Vec<String> = self
            .store
            .list()
            .await
            .map_err(IngestionError::List)?
            .into_iter()
            .filter(|key| self.policy.allows(key))
            .collect();
        images.sort();
        Ok(images)
    }

    pub async fn fetch_image(&self, image_key: &str) -> Result<Bytes, StorageError> {
        self.store.get(image_key).await
    }
}
