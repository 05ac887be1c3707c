//! Service construction
//!
//! Order: secrets -> captioning client -> caption generator -> metadata
//! writer -> ingestion pipeline -> auth gate. Everything is built once and
//! shared through [`AppState`].

use crate::auth::{AuthGate, OAuthClient, OAuthClientConfig, SessionKeys};
use crate::services::{IngestionPipeline, MetadataWriter};
use crate::state::AppState;
use crate::utils::cookies::CookieSettings;
use crate::validation::UploadPolicy;
use anyhow::{Context, Result};
use pictura_core::{Config, SecretsBackend};
use pictura_services::{
    CaptionGenerator, EnvSecretAccessor, GcpSecretManager, GeminiClient, SecretAccessor,
};
use pictura_storage::BlobStore;
use std::sync::Arc;
use std::time::Duration;

pub async fn initialize_services(
    config: &Config,
    store: Arc<dyn BlobStore>,
) -> Result<Arc<AppState>> {
    let secrets = setup_secrets(config)?;

    let gemini = config.gemini();
    let api_key = secrets
        .access(&gemini.api_key_secret)
        .await
        .with_context(|| format!("Failed to read secret {}", gemini.api_key_secret))?;

    let client = GeminiClient::new(
        api_key,
        gemini.model.clone(),
        gemini.base_url.clone(),
        Duration::from_secs(gemini.timeout_secs),
    )?;
    tracing::info!(model = %client.model(), "Gemini client initialized");

    let captioner = Arc::new(CaptionGenerator::new(Arc::new(client)));

    let auth = if config.auth().enabled {
        Some(Arc::new(setup_auth(config, secrets.as_ref()).await?))
    } else {
        tracing::warn!("AUTH_ENABLED=false, every route is public");
        None
    };

    Ok(build_state(config, store, captioner, auth))
}

/// Assemble the state from already constructed collaborators.
pub fn build_state(
    config: &Config,
    store: Arc<dyn BlobStore>,
    captioner: Arc<CaptionGenerator>,
    auth: Option<Arc<AuthGate>>,
) -> Arc<AppState> {
    let metadata = MetadataWriter::new(store.clone(), config.write_text_sidecar());
    let policy = UploadPolicy {
        allowed_extensions: config.allowed_extensions().to_vec(),
        max_file_size_bytes: config.max_file_size_bytes(),
    };
    let pipeline = IngestionPipeline::new(store, captioner, metadata, policy);

    Arc::new(AppState {
        pipeline: Arc::new(pipeline),
        auth,
        cookies: CookieSettings::new(config.is_production()),
    })
}

fn setup_secrets(config: &Config) -> Result<Arc<dyn SecretAccessor>> {
    let secrets: Arc<dyn SecretAccessor> = match config.secrets_backend() {
        SecretsBackend::Gcp => {
            let project_id = config
                .gcp_project_id()
                .context("GCP_PROJECT_ID not configured")?;
            tracing::info!(project_id = %project_id, "Using Secret Manager");
            Arc::new(GcpSecretManager::new(project_id)?)
        }
        SecretsBackend::Env => {
            tracing::info!("Reading secrets from environment variables");
            Arc::new(EnvSecretAccessor::new())
        }
    };
    Ok(secrets)
}

async fn setup_auth(config: &Config, secrets: &dyn SecretAccessor) -> Result<AuthGate> {
    let auth = config.auth();

    let raw = secrets
        .access(&auth.client_secret_name)
        .await
        .with_context(|| format!("Failed to read secret {}", auth.client_secret_name))?;
    let client_config = OAuthClientConfig::from_json(&raw)?;

    let oauth = OAuthClient::new(client_config, auth.redirect_url.clone(), auth.scopes.clone())?;

    let session_secret = auth
        .session_secret
        .as_deref()
        .context("SESSION_SECRET not configured")?;
    let keys = SessionKeys::from_secret(session_secret)?;

    tracing::info!(redirect_url = %oauth.redirect_url(), "OAuth gate enabled");

    Ok(AuthGate { oauth, keys })
}
