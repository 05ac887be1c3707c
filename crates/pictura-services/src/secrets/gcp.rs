//! Google Cloud Secret Manager accessor over the REST API

use super::{SecretAccessor, SecretError};
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

const API_BASE: &str = "https://secretmanager.googleapis.com";
const METADATA_BASE: &str = "http://metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the bearer token for Secret Manager comes from.
#[derive(Clone)]
pub enum TokenSource {
    /// A pre-issued access token (e.g. `gcloud auth print-access-token`)
    Static(String),
    /// The GCE/Cloud Run metadata server
    MetadataServer { base_url: String },
}

impl Debug for TokenSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TokenSource::Static(_) => f.write_str("Static(<redacted>)"),
            TokenSource::MetadataServer { base_url } => f
                .debug_struct("MetadataServer")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl TokenSource {
    /// `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise the metadata server.
    pub fn from_env() -> Self {
        match std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            Ok(token) if !token.is_empty() => TokenSource::Static(token),
            _ => TokenSource::MetadataServer {
                base_url: METADATA_BASE.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Reads `projects/{project}/secrets/{name}/versions/latest`.
pub struct GcpSecretManager {
    http_client: reqwest::Client,
    project_id: String,
    api_base: String,
    token_source: TokenSource,
}

impl Debug for GcpSecretManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GcpSecretManager")
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl GcpSecretManager {
    pub fn new(project_id: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_endpoints(project_id, API_BASE, TokenSource::from_env())
    }

    pub fn with_endpoints(
        project_id: impl Into<String>,
        api_base: impl Into<String>,
        token_source: TokenSource,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client for Secret Manager")?;

        Ok(Self {
            http_client,
            project_id: project_id.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_source,
        })
    }

    pub fn secret_version_path(&self, name: &str) -> String {
        format!(
            "projects/{}/secrets/{}/versions/latest",
            self.project_id, name
        )
    }

    async fn access_token(&self) -> Result<String, SecretError> {
        match &self.token_source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer { base_url } => {
                let response = self
                    .http_client
                    .get(format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH))
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| {
                        SecretError::Backend(format!("Metadata server unreachable: {}", e))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SecretError::Backend(format!(
                        "Metadata server returned {}",
                        status
                    )));
                }

                let token: MetadataToken = response.json().await.map_err(|e| {
                    SecretError::Backend(format!("Invalid metadata token response: {}", e))
                })?;
                Ok(token.access_token)
            }
        }
    }
}

#[async_trait]
impl SecretAccessor for GcpSecretManager {
    async fn access(&self, name: &str) -> Result<String, SecretError> {
        let start = std::time::Instant::now();
        let token = self.access_token().await?;
        let version = self.secret_version_path(name);

        let response = self
            .http_client
            .get(format!("{}/v1/{}:access", self.api_base, version))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Backend(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound(version));
        }
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(SecretError::AccessDenied(version));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SecretError::Backend(format!(
                "Secret Manager request failed: {} - {}",
                status, error_text
            )));
        }

        let parsed: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| SecretError::InvalidPayload(e.to_string()))?;

        let bytes = general_purpose::STANDARD
            .decode(parsed.payload.data.trim())
            .map_err(|e| SecretError::InvalidPayload(e.to_string()))?;
        let value =
            String::from_utf8(bytes).map_err(|e| SecretError::InvalidPayload(e.to_string()))?;

        tracing::info!(
            secret = %name,
            project_id = %self.project_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Secret resolved from Secret Manager"
        );

        Ok(value)
    }
}
