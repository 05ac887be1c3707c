//! Pictura Storage Library
//!
//! Blob store abstraction used by the ingestion pipeline. One store is bound to
//! one bucket; keys are flat object names (the sanitized upload filename and its
//! metadata sidecars).
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_blob_store;
#[cfg(feature = "storage-gcs")]
pub use gcs::GcsBlobStore;
#[cfg(feature = "storage-local")]
pub use local::LocalBlobStore;
pub use pictura_core::StorageBackend;
pub use traits::{BlobStore, StorageError, StorageResult};
