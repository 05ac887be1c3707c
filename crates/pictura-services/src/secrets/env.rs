use super::{SecretAccessor, SecretError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Reads each secret from the environment variable of the same name.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretAccessor;

impl EnvSecretAccessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretAccessor for EnvSecretAccessor {
    async fn access(&self, name: &str) -> Result<String, SecretError> {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => {
                tracing::debug!(secret = %name, "Secret resolved from environment");
                Ok(value)
            }
            _ => Err(SecretError::NotFound(name.to_string())),
        }
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Default, Clone)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretAccessor for StaticSecrets {
    async fn access(&self, name: &str) -> Result<String, SecretError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}
