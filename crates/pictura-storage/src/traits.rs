//! Blob store abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob store bound to a single bucket.
///
/// Writes overwrite silently (last write wins). Reads of a missing key fail
/// with [`StorageError::NotFound`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key` and return the object's public URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Read the full object stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Every key in the bucket. Order is whatever the backend returns; there is
    /// no pagination.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
