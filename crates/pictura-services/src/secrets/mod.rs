//! Named secret resolution
//!
//! Secrets (the captioning API key, the OAuth client configuration) are read
//! once at process start and handed to the services that need them.

mod env;
mod gcp;

pub use env::{EnvSecretAccessor, StaticSecrets};
pub use gcp::{GcpSecretManager, TokenSource};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Access to secret denied: {0}")]
    AccessDenied(String),

    #[error("Secret payload is invalid: {0}")]
    InvalidPayload(String),

    #[error("Secret backend error: {0}")]
    Backend(String),
}

/// Resolves the latest value of a named secret.
#[async_trait]
pub trait SecretAccessor: Send + Sync {
    async fn access(&self, name: &str) -> Result<String, SecretError>;
}
