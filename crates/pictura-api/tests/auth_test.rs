//! OAuth gate integration tests.
//!
//! Run with: `cargo test -p pictura-api --test auth_test`

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use helpers::{cookie_pair, set_cookies, setup_authenticated_app};
use mockito::{Matcher, Server};

const UNUSED_TOKEN_URI: &str = "http://127.0.0.1:9/token";

#[tokio::test]
async fn test_page_load_without_session_redirects_to_authorize() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app.client().get("/").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/authorize");
}

#[tokio::test]
async fn test_upload_without_session_is_401() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app.client().post("/").text("x").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(app.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_session_cookie_grants_access() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/")
        .add_header("Cookie", app.session_cookie())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("/logout"));
}

#[tokio::test]
async fn test_bearer_credential_grants_access() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/image_details/any.jpg")
        .add_header(
            "Authorization",
            format!("Bearer {}", app.sealed_credential(Duration::minutes(5))),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/")
        .add_header("Cookie", app.session_cookie_expiring_in(Duration::seconds(-1)))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/authorize");
}

#[tokio::test]
async fn test_tampered_session_is_rejected() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/files/a.jpg")
        .add_header("Cookie", "pictura_session=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_authorize_redirects_to_provider_with_signed_state() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app.client().get("/authorize").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let location = response.header("location");
    let location = location.to_str().unwrap();
    assert!(location.starts_with("https://accounts.example.test/o/oauth2/auth?"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("access_type=online"));

    let state_pair = cookie_pair(&response, "pictura_oauth_state").unwrap();
    let state = state_pair.split_once('=').unwrap().1;
    assert!(location.contains(&format!("state={}", state)));
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("pictura_oauth_state=") && c.contains("HttpOnly")));
}

#[tokio::test]
async fn test_callback_with_mismatched_state_is_rejected() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let authorize = app.client().get("/authorize").await;
    let state_cookie = cookie_pair(&authorize, "pictura_oauth_state").unwrap();

    let response = app
        .client()
        .get("/oauth2callback")
        .add_query_param("code", "4/abc")
        .add_query_param("state", "forged.1.state")
        .add_header("Cookie", state_cookie)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_OAUTH_TOKEN");
}

#[tokio::test]
async fn test_callback_reports_provider_denial() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/oauth2callback")
        .add_query_param("error", "access_denied")
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_sign_in_flow() {
    let mut provider = Server::new_async().await;
    let token_mock = provider
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("code".into(), "4/granted".into()),
            Matcher::UrlEncoded(
                "redirect_uri".into(),
                "http://localhost:8080/oauth2callback".into(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "ya29.live", "expires_in": 3599, "token_type": "Bearer"}"#)
        .create_async()
        .await;

    let app = setup_authenticated_app(&format!("{}/token", provider.url())).await;

    let authorize = app.client().get("/authorize").await;
    let state_cookie = cookie_pair(&authorize, "pictura_oauth_state").unwrap();
    let state = state_cookie.split_once('=').unwrap().1.to_string();

    let callback = app
        .client()
        .get("/oauth2callback")
        .add_query_param("code", "4/granted")
        .add_query_param("state", &state)
        .add_header("Cookie", state_cookie.clone())
        .await;

    assert_eq!(callback.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(callback.header("location"), "/");
    token_mock.assert_async().await;

    let session = cookie_pair(&callback, "pictura_session").unwrap();
    assert!(!session.contains("ya29.live"));
    assert!(set_cookies(&callback)
        .iter()
        .any(|c| c.starts_with("pictura_oauth_state=;") && c.contains("Max-Age=0")));

    let page = app.client().get("/").add_header("Cookie", session).await;
    assert_eq!(page.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = setup_authenticated_app(UNUSED_TOKEN_URI).await;

    let response = app
        .client()
        .get("/logout")
        .add_header("Cookie", app.session_cookie())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        cookie_pair(&response, "pictura_session").as_deref(),
        Some("pictura_session=")
    );
}
