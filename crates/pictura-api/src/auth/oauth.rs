//! OAuth2 authorization-code client

use super::{AuthError, SessionCredential};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Client registration in the `client_secret.json` layout.
#[derive(Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

impl OAuthClientConfig {
    /// Parse either `{"web": {...}}` / `{"installed": {...}}` or the bare
    /// fields at top level.
    pub fn from_json(raw: &str) -> Result<Self, AuthError> {
        let mut value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| AuthError::ClientConfig(e.to_string()))?;

        for wrapper in ["web", "installed"] {
            if let Some(inner) = value.get_mut(wrapper) {
                let inner = inner.take();
                return serde_json::from_value(inner)
                    .map_err(|e| AuthError::ClientConfig(e.to_string()));
            }
        }

        serde_json::from_value(value).map_err(|e| AuthError::ClientConfig(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

pub struct OAuthClient {
    http_client: reqwest::Client,
    config: OAuthClientConfig,
    redirect_url: String,
    scopes: Vec<String>,
}

impl OAuthClient {
    /// `redirect_url` overrides the first registered redirect URI.
    pub fn new(
        config: OAuthClientConfig,
        redirect_url: Option<String>,
        scopes: Vec<String>,
    ) -> Result<Self, AuthError> {
        let redirect_url = redirect_url
            .or_else(|| config.redirect_uris.first().cloned())
            .ok_or_else(|| {
                AuthError::ClientConfig(
                    "no redirect URI configured (set OAUTH_REDIRECT_URL)".to_string(),
                )
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::ClientConfig(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            redirect_url,
            scopes,
        })
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Provider URL the browser is sent to.
    pub fn authorization_url(&self, state: &str) -> String {
        let scope = self.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("scope", scope.as_str()),
            ("access_type", "online"),
            ("include_granted_scopes", "true"),
            ("state", state),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.config.auth_uri, query)
    }

    /// Trade an authorization code for an access credential.
    pub async fn exchange_code(&self, code: &str) -> Result<SessionCredential, AuthError> {
        let start = std::time::Instant::now();
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::TokenExchange(format!(
                "token endpoint returned {} - {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("invalid token response: {}", e)))?;

        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        tracing::info!(
            expires_in_secs = expires_in,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "OAuth code exchanged"
        );

        Ok(SessionCredential {
            access_token: token.access_token,
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scope: token.scope,
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
        })
    }
}
