//! Test helpers: build the router over a temporary local store and a scripted
//! captioning service.
//!
//! Run from workspace root: `cargo test -p pictura-api`.

pub mod captioning;

use axum_test::TestServer;
use captioning::ScriptedCaptioner;
use chrono::{Duration, Utc};
use pictura_api::auth::{AuthGate, OAuthClient, OAuthClientConfig, SessionCredential, SessionKeys};
use pictura_api::setup::{routes, services};
use pictura_core::{AppConfig, Config, StorageBackend};
use pictura_services::CaptionGenerator;
use pictura_storage::{BlobStore, LocalBlobStore};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SESSION_SECRET: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=";
pub const TEST_MAX_FILE_SIZE: usize = 256 * 1024;
pub const CAPTION_REPLY: &str =
    r#"Here you go: {"title": "Harbor at dawn", "description": "Fishing boats moored in calm water"}"#;

/// Test application: server plus the collaborators behind it.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<dyn BlobStore>,
    pub captioner: Arc<ScriptedCaptioner>,
    pub keys: Option<SessionKeys>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// `Cookie` header value carrying a valid session.
    pub fn session_cookie(&self) -> String {
        self.session_cookie_expiring_in(Duration::hours(1))
    }

    pub fn session_cookie_expiring_in(&self, expires_in: Duration) -> String {
        format!("pictura_session={}", self.sealed_credential(expires_in))
    }

    pub fn sealed_credential(&self, expires_in: Duration) -> String {
        let keys = self.keys.as_ref().expect("auth is enabled for this app");
        keys.seal(&SessionCredential {
            access_token: "ya29.test".to_string(),
            token_type: "Bearer".to_string(),
            scope: Some("openid email".to_string()),
            expires_at: Utc::now() + expires_in,
        })
        .expect("seal credential")
    }
}

fn test_config(dir: &TempDir, auth_enabled: bool) -> Config {
    Config::from(AppConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: Some(dir.path().display().to_string()),
        local_storage_base_url: Some("http://localhost:8080/files".to_string()),
        max_file_size_bytes: TEST_MAX_FILE_SIZE,
        auth: pictura_core::AuthConfig {
            enabled: auth_enabled,
            session_secret: auth_enabled.then(|| TEST_SESSION_SECRET.to_string()),
            ..AppConfig::default().auth
        },
        ..AppConfig::default()
    })
}

async fn build_app(reply: &str, auth: Option<(AuthGate, SessionKeys)>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = test_config(&temp_dir, auth.is_some());

    let store: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(
            temp_dir.path(),
            "http://localhost:8080/files".to_string(),
        )
        .await
        .expect("create local store"),
    );
    let captioner = Arc::new(ScriptedCaptioner::replying(reply));
    let generator = Arc::new(CaptionGenerator::new(captioner.clone()));

    let (gate, keys) = match auth {
        Some((gate, keys)) => (Some(Arc::new(gate)), Some(keys)),
        None => (None, None),
    };

    let state = services::build_state(&config, store.clone(), generator, gate);
    let router = routes::setup_routes(&config, state);
    let server = TestServer::new(router).expect("create test server");

    TestApp {
        server,
        store,
        captioner,
        keys,
        _temp_dir: temp_dir,
    }
}

/// App with the OAuth gate disabled.
pub async fn setup_test_app(reply: &str) -> TestApp {
    build_app(reply, None).await
}

/// App behind the OAuth gate; the provider's token endpoint is `token_uri`.
pub async fn setup_authenticated_app(token_uri: &str) -> TestApp {
    let client_config = OAuthClientConfig {
        client_id: "client-123.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        auth_uri: "https://accounts.example.test/o/oauth2/auth".to_string(),
        token_uri: token_uri.to_string(),
        redirect_uris: vec!["http://localhost:8080/oauth2callback".to_string()],
    };
    let oauth = OAuthClient::new(
        client_config,
        None,
        vec!["openid".to_string(), "email".to_string()],
    )
    .expect("create oauth client");
    let keys = SessionKeys::from_secret(TEST_SESSION_SECRET).expect("session keys");

    build_app(
        CAPTION_REPLY,
        Some((
            AuthGate {
                oauth,
                keys: keys.clone(),
            },
            keys,
        )),
    )
    .await
}

/// Smallest byte sequence that looks like a JPEG to a human reader.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(b"\x00\x10JFIF\x00");
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// All `Set-Cookie` values of a response.
pub fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// `name=value` part of the `Set-Cookie` for `name`.
pub fn cookie_pair(response: &axum_test::TestResponse, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", name)))
        .and_then(|c| c.split(';').next().map(String::from))
}
