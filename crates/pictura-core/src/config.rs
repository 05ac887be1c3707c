//! Configuration module
//!
//! Settings are read once at startup from the process environment (after
//! loading `.env` when present) and validated before any service is built.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8080;
const MAX_FILE_SIZE_MB: usize = 10;
const GEMINI_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_KEY_SECRET: &str = "GEMINI_API_KEY";
const DEFAULT_OAUTH_CLIENT_SECRET: &str = "OAUTH_CLIENT_CONFIG";
const DEFAULT_OAUTH_SCOPES: &str = "openid email profile";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Where named secrets are resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    /// Google Cloud Secret Manager, latest version of each secret
    Gcp,
    /// Environment variables named after the secret (local development)
    Env,
}

impl FromStr for SecretsBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcp" | "secret-manager" => Ok(SecretsBackend::Gcp),
            "env" => Ok(SecretsBackend::Env),
            _ => Err(anyhow::anyhow!("Invalid secrets backend: {}", s)),
        }
    }
}

/// Captioning service settings
#[derive(Clone, Debug)]
pub struct GeminiSettings {
    /// Secret name holding the API key
    pub api_key_secret: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// OAuth gate settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Base64 32-byte key used to seal session cookies
    pub session_secret: Option<String>,
    /// Secret name holding the OAuth client JSON
    pub client_secret_name: String,
    pub redirect_url: Option<String>,
    pub scopes: Vec<String>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub gcs_bucket: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Secrets
    pub secrets_backend: SecretsBackend,
    pub gcp_project_id: Option<String>,
    // Upload handling
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub write_text_sidecar: bool,
    pub gemini: GeminiSettings,
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    /// Development defaults: local storage, environment secrets, auth disabled.
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            environment: "development".to_string(),
            log_format: LogFormat::Compact,
            storage_backend: StorageBackend::Local,
            gcs_bucket: None,
            local_storage_path: Some("./data/images".to_string()),
            local_storage_base_url: Some(format!("http://localhost:{}/files", DEFAULT_PORT)),
            secrets_backend: SecretsBackend::Env,
            gcp_project_id: None,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string()],
            write_text_sidecar: true,
            gemini: GeminiSettings {
                api_key_secret: DEFAULT_GEMINI_KEY_SECRET.to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                timeout_secs: GEMINI_TIMEOUT_SECS,
            },
            auth: AuthConfig {
                enabled: false,
                session_secret: None,
                client_secret_name: DEFAULT_OAUTH_CLIENT_SECRET.to_string(),
                redirect_url: None,
                scopes: split_list(DEFAULT_OAUTH_SCOPES),
            },
        }
    }
}

/// Application configuration wrapper exposing read-only getters.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.inner().log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn gcs_bucket(&self) -> Option<&str> {
        self.inner().gcs_bucket.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn secrets_backend(&self) -> SecretsBackend {
        self.inner().secrets_backend
    }

    pub fn gcp_project_id(&self) -> Option<&str> {
        self.inner().gcp_project_id.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn write_text_sidecar(&self) -> bool {
        self.inner().write_text_sidecar
    }

    pub fn gemini(&self) -> &GeminiSettings {
        &self.inner().gemini
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.inner().auth
    }
}

impl From<AppConfig> for Config {
    fn from(config: AppConfig) -> Self {
        Config(Box::new(config))
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    raw.map(|s| s.trim().to_lowercase())
        .and_then(|s| match s.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());
        let is_production = is_production_env(&environment);

        let server_port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => DEFAULT_PORT,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Compact,
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Gcs,
        };

        let secrets_backend = match var("SECRETS_BACKEND") {
            Some(raw) => raw.parse()?,
            None => SecretsBackend::Gcp,
        };

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_extensions = var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| "jpg,jpeg".to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let gemini = GeminiSettings {
            api_key_secret: var("GEMINI_API_KEY_SECRET")
                .unwrap_or_else(|| DEFAULT_GEMINI_KEY_SECRET.to_string()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: var("GEMINI_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(GEMINI_TIMEOUT_SECS),
        };

        let auth = AuthConfig {
            enabled: parse_bool(var("AUTH_ENABLED"), true),
            session_secret: var("SESSION_SECRET"),
            client_secret_name: var("OAUTH_CLIENT_SECRET_NAME")
                .unwrap_or_else(|| DEFAULT_OAUTH_CLIENT_SECRET.to_string()),
            redirect_url: var("OAUTH_REDIRECT_URL"),
            scopes: split_list(
                &var("OAUTH_SCOPES").unwrap_or_else(|| DEFAULT_OAUTH_SCOPES.to_string()),
            ),
        };

        if is_production && !auth.enabled {
            return Err(anyhow::anyhow!(
                "AUTH_ENABLED cannot be false in production"
            ));
        }

        let config = AppConfig {
            server_port,
            environment,
            log_format,
            storage_backend,
            gcs_bucket: var("GCS_BUCKET").or_else(|| var("BUCKET_NAME")),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            secrets_backend,
            gcp_project_id: var("GCP_PROJECT_ID").or_else(|| var("GOOGLE_CLOUD_PROJECT")),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions,
            write_text_sidecar: parse_bool(var("METADATA_WRITE_TEXT"), true),
            gemini,
            auth,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::Gcs => {
                if self.gcs_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "GCS_BUCKET must be set when using the gcs storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.secrets_backend == SecretsBackend::Gcp && self.gcp_project_id.is_none() {
            return Err(anyhow::anyhow!(
                "GCP_PROJECT_ID must be set when using the gcp secrets backend"
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.auth.enabled && self.auth.session_secret.is_none() {
            return Err(anyhow::anyhow!(
                "SESSION_SECRET must be set when AUTH_ENABLED is true"
            ));
        }

        Ok(())
    }
}
