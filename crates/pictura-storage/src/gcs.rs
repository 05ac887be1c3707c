use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload, Result as ObjectResult,
};

const PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Google Cloud Storage implementation
///
/// Credentials are resolved by `object_store` from the environment
/// (`GOOGLE_SERVICE_ACCOUNT`, `GOOGLE_APPLICATION_CREDENTIALS`) or, on GCP
/// runtimes, the instance metadata server.
#[derive(Clone)]
pub struct GcsBlobStore {
    store: GoogleCloudStorage,
    bucket: String,
}

impl GcsBlobStore {
    pub fn new(bucket: String) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GcsBlobStore { store, bucket })
    }

    /// Public URL in the `https://storage.googleapis.com/{bucket}/{key}` form.
    fn generate_url(&self, key: &str) -> String {
        public_url(&self.bucket, key)
    }
}

pub(crate) fn public_url(bucket: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}/{}", PUBLIC_HOST, bucket, encoded.join("/"))
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        let size = data.len() as u64;
        let location = Path::from(key);
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            &self.store,
            &location,
            PutPayload::from(data),
            options,
        )
        .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(self.generate_url(key))
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let start = std::time::Instant::now();
        let location = Path::from(key);

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "GCS download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS download successful"
        );

        Ok(bytes)
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let start = std::time::Instant::now();

        let objects: Vec<_> = object_store::ObjectStore::list(&self.store, None)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    "GCS list failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        let keys: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();

        tracing::debug!(
            bucket = %self.bucket,
            count = keys.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS list successful"
        );

        Ok(keys)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}
