//! Pictura Core Library
//!
//! Domain models, error types, configuration and key derivation shared by the
//! storage, services and API crates.

pub mod config;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AppConfig, AuthConfig, Config, GeminiSettings, LogFormat, SecretsBackend};
pub use encryption::SessionCipher;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use keys::{metadata_key, MetadataFormat};
pub use models::{CaptionResult, CaptionStatus, ImageDetails};
pub use storage_types::StorageBackend;
