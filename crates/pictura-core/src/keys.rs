//! Object key derivation for metadata sidecars
//!
//! Sidecars live in the same bucket as the image they describe. The key is a
//! pure function of the image key so a record can always be located again
//! without an index:
//!
//! - `sunset.jpg` -> `sunset.json`, `sunset.txt`
//! - `foo bar.jpg` -> `foo_bar.json`, `foo_bar.txt`

/// Sidecar flavours written next to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    Json,
    Text,
}

impl MetadataFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MetadataFormat::Json => "json",
            MetadataFormat::Text => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MetadataFormat::Json => "application/json",
            MetadataFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

/// Strip the last extension, replace spaces with underscores, append the
/// sidecar extension.
pub fn metadata_key(image_key: &str, format: MetadataFormat) -> String {
    let stem = match image_key.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => image_key,
    };
    format!("{}.{}", stem.replace(' ', "_"), format.extension())
}
