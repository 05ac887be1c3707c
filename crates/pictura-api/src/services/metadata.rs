//! Metadata sidecars
//!
//! The caption of `photo.jpg` is kept next to it as `photo.json` (the full
//! caption result) and, optionally, `photo.txt` (title and description as
//! plain text). Writes overwrite whatever was there.

use bytes::Bytes;
use pictura_core::{metadata_key, CaptionResult, ImageDetails, MetadataFormat};
use pictura_storage::{BlobStore, StorageError, StorageResult};
use serde::Serialize;
use std::sync::Arc;

/// Keys written for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataKeys {
    pub json: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone)]
pub struct MetadataWriter {
    store: Arc<dyn BlobStore>,
    write_text_sidecar: bool,
}

impl MetadataWriter {
    pub fn new(store: Arc<dyn BlobStore>, write_text_sidecar: bool) -> Self {
        Self {
            store,
            write_text_sidecar,
        }
    }

    #[tracing::instrument(skip(self, result), fields(status = %result.status))]
    pub async fn write(
        &self,
        image_key: &str,
        result: &CaptionResult,
    ) -> StorageResult<MetadataKeys> {
        let json_key = metadata_key(image_key, MetadataFormat::Json);
        let body = to_indented_json(result)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode metadata: {}", e)))?;

        self.store
            .put(
                &json_key,
                Bytes::from(body),
                MetadataFormat::Json.content_type(),
            )
            .await?;

        let text_key = if self.write_text_sidecar {
            let key = metadata_key(image_key, MetadataFormat::Text);
            self.store
                .put(
                    &key,
                    Bytes::from(result.to_text()),
                    MetadataFormat::Text.content_type(),
                )
                .await?;
            Some(key)
        } else {
            None
        };

        tracing::info!(json_key = %json_key, text_key = ?text_key, "Metadata written");

        Ok(MetadataKeys {
            json: json_key,
            text: text_key,
        })
    }

    /// Details for `image_key`. Absent records yield the pending placeholders
    /// and undecodable ones the unreadable placeholders; only store failures
    /// are errors.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, image_key: &str) -> StorageResult<ImageDetails> {
        let key = metadata_key(image_key, MetadataFormat::Json);

        if !self.store.exists(&key).await? {
            tracing::debug!(metadata_key = %key, "No metadata record yet");
            return Ok(ImageDetails::pending(image_key));
        }

        let data = match self.store.get(&key).await {
            Ok(data) => data,
            // Deleted between the existence check and the read
            Err(StorageError::NotFound(_)) => return Ok(ImageDetails::pending(image_key)),
            Err(e) => return Err(e),
        };

        match serde_json::from_slice::<serde_json::Value>(&data) {
            Ok(record) => Ok(ImageDetails::from_record(image_key, &record)),
            Err(e) => {
                tracing::warn!(metadata_key = %key, error = %e, "Metadata record is not valid JSON");
                Ok(ImageDetails::unreadable(image_key))
            }
        }
    }
}

/// JSON with four-space indentation.
fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictura_core::models::{
        FAILED_DESCRIPTION, MISSING_DESCRIPTION, PENDING_DESCRIPTION, PENDING_TITLE,
        UNREADABLE_TITLE,
    };
    use pictura_core::CaptionStatus;
    use pictura_storage::LocalBlobStore;
    use tempfile::TempDir;

    async fn writer(text_sidecar: bool) -> (MetadataWriter, Arc<dyn BlobStore>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn BlobStore> = Arc::new(
            LocalBlobStore::new(dir.path(), "http://localhost:8080/files".to_string())
                .await
                .unwrap(),
        );
        (MetadataWriter::new(store.clone(), text_sidecar), store, dir)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trips_caption() {
        let (writer, store, _dir) = writer(true).await;
        let result = CaptionResult::success(Some("Harbor".into()), Some("Boats".into()));

        let keys = writer.write("harbor view.jpg", &result).await.unwrap();
        assert_eq!(keys.json, "harbor_view.json");
        assert_eq!(keys.text.as_deref(), Some("harbor_view.txt"));

        let text = store.get("harbor_view.txt").await.unwrap();
        assert_eq!(&text[..], b"Title: Harbor\nDescription: Boats");

        let details = writer.read("harbor view.jpg").await.unwrap();
        assert_eq!(details.title, "Harbor");
        assert_eq!(details.description, "Boats");
        assert_eq!(details.status, Some(CaptionStatus::Success));
    }

    #[tokio::test]
    async fn test_json_record_uses_four_space_indent() {
        let (writer, store, _dir) = writer(false).await;
        let result = CaptionResult::failure("No JSON found in response");

        let keys = writer.write("cat.jpg", &result).await.unwrap();
        assert!(keys.text.is_none());
        assert!(!store.exists("cat.txt").await.unwrap());

        let raw = store.get("cat.json").await.unwrap();
        let raw = std::str::from_utf8(&raw).unwrap();
        assert!(raw.starts_with("{\n    \"title\": "));
        assert!(raw.contains("\"status\": \"failure\""));
        assert!(raw.contains("\"error_message\": \"No JSON found in response\""));

        let details = writer.read("cat.jpg").await.unwrap();
        assert_eq!(details.description, FAILED_DESCRIPTION);
        assert_eq!(details.status, Some(CaptionStatus::Failure));
        assert_eq!(
            details.error_message.as_deref(),
            Some("No JSON found in response")
        );
    }

    #[tokio::test]
    async fn test_rewrite_overwrites_record() {
        let (writer, _store, _dir) = writer(true).await;
        writer
            .write("a.jpg", &CaptionResult::failure("boom"))
            .await
            .unwrap();
        writer
            .write("a.jpg", &CaptionResult::success(Some("Second".into()), None))
            .await
            .unwrap();

        let details = writer.read("a.jpg").await.unwrap();
        assert_eq!(details.title, "Second");
        assert!(details.error_message.is_none());
    }

    #[tokio::test]
    async fn test_missing_record_is_pending() {
        let (writer, _store, _dir) = writer(true).await;
        let details = writer.read("never.jpg").await.unwrap();
        assert_eq!(details.title, PENDING_TITLE);
        assert_eq!(details.description, PENDING_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_undecodable_record_is_unreadable() {
        let (writer, store, _dir) = writer(true).await;
        store
            .put("broken.json", Bytes::from_static(b"{not json"), "application/json")
            .await
            .unwrap();

        let details = writer.read("broken.jpg").await.unwrap();
        assert_eq!(details.title, UNREADABLE_TITLE);
    }

    #[tokio::test]
    async fn test_record_missing_keys_reports_not_found() {
        let (writer, store, _dir) = writer(true).await;
        store
            .put(
                "partial.json",
                Bytes::from_static(br#"{"title": "Only a title"}"#),
                "application/json",
            )
            .await
            .unwrap();

        let details = writer.read("partial.jpg").await.unwrap();
        assert_eq!(details.title, "Only a title");
        assert_eq!(details.description, MISSING_DESCRIPTION);
    }
}
