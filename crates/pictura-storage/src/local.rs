use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem blob store, used for development and tests.
/// Objects are plain files below `base_path`; the content type is not stored.
#[derive(Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory standing in for the bucket (e.g., "./data/images")
    /// * `base_url` - Base URL objects are served under (e.g., "http://localhost:8080/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore {
            base_path,
            base_url,
        })
    }

    /// Convert a key to a filesystem path, refusing anything that could escape
    /// the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let escapes = Path::new(key)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if key.is_empty() || escapes || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(key);

        if let (Ok(base), Ok(canonical)) = (self.base_path.canonicalize(), path.canonicalize()) {
            if canonical.strip_prefix(&base).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn generate_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(key)
        )
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.generate_url(key))
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(Bytes::from(data))
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&self.base_path) {
                    let key: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    keys.push(key.join("/"));
                }
            }
        }

        tracing::debug!(
            path = %self.base_path.display(),
            count = keys.len(),
            "Local storage list successful"
        );

        Ok(keys)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store(dir: &Path) -> LocalBlobStore {
        LocalBlobStore::new(dir, "http://localhost:8080/files".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        let url = storage
            .put("cat.jpg", Bytes::from_static(b"jpeg bytes"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/cat.jpg");

        let data = storage.get("cat.jpg").await.unwrap();
        assert_eq!(&data[..], b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        storage
            .put("cat.json", Bytes::from_static(b"first"), "application/json")
            .await
            .unwrap();
        storage
            .put("cat.json", Bytes::from_static(b"second"), "application/json")
            .await
            .unwrap();

        assert_eq!(&storage.get("cat.json").await.unwrap()[..], b"second");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        let result = storage.get("missing.jpg").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .put("../escape.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_dots_inside_a_name_are_allowed() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        storage
            .put("holiday..final.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();

        assert!(storage.exists("holiday..final.jpg").await.unwrap());
        assert!(matches!(
            storage.get("photos/../../x.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_io_failure_is_not_reported_as_missing() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        storage
            .put("cat.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();

        // A file used as a directory fails with ENOTDIR, not ENOENT.
        assert!(matches!(
            storage.exists("cat.jpg/cat.json").await,
            Err(StorageError::IoError(_))
        ));
        assert!(matches!(
            storage.get("cat.jpg/cat.json").await,
            Err(StorageError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;

        storage
            .put("exists.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();

        assert!(storage.exists("exists.jpg").await.unwrap());
        assert!(!storage.exists("nope.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_returns_all_keys() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        assert!(storage.list().await.unwrap().is_empty());

        for key in ["a.jpg", "a.json", "nested/b.jpeg"] {
            storage
                .put(key, Bytes::from_static(b"x"), "application/octet-stream")
                .await
                .unwrap();
        }

        let mut keys = storage.list().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a.jpg", "a.json", "nested/b.jpeg"]);
    }

    #[tokio::test]
    async fn test_url_encodes_key() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        let url = storage
            .put("my photo.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/my%20photo.jpg");
    }
}
