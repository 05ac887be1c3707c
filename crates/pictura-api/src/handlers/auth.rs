//! OAuth sign-in, callback and sign-out

use crate::auth::session::{constant_time_eq, STATE_TTL_SECS};
use crate::auth::{AuthError, AuthGate};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::cookies::{append_set_cookie, read_cookie, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use pictura_core::AppError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn gate(state: &AppState) -> Result<&Arc<AuthGate>, HttpAppError> {
    state
        .auth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Authentication is disabled".to_string()).into())
}

/// Start the authorization-code flow.
#[tracing::instrument(skip_all)]
pub async fn authorize(State(state): State<Arc<AppState>>) -> Result<Response, HttpAppError> {
    let gate = gate(&state)?;

    let oauth_state = gate.keys.sign_state()?;
    let url = gate.oauth.authorization_url(&oauth_state);

    let mut response = Redirect::to(&url).into_response();
    append_set_cookie(
        &mut response,
        &state
            .cookies
            .build(OAUTH_STATE_COOKIE, &oauth_state, Some(STATE_TTL_SECS)),
    )?;
    Ok(response)
}

/// Provider redirect target: check `state`, exchange the code, open the session.
#[tracing::instrument(skip_all)]
pub async fn oauth2callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, HttpAppError> {
    let gate = gate(&state)?;

    if let Some(error) = query.error {
        return Err(AuthError::Denied(error).into());
    }

    let returned_state = query.state.ok_or(AuthError::StateMismatch)?;
    let expected_state = read_cookie(&headers, OAUTH_STATE_COOKIE).ok_or(AuthError::StateMismatch)?;
    if !constant_time_eq(&returned_state, &expected_state) || !gate.keys.verify_state(&returned_state)
    {
        return Err(AuthError::StateMismatch.into());
    }

    let code = query.code.ok_or(AuthError::MissingCode)?;
    let credential = gate.oauth.exchange_code(&code).await?;
    let sealed = gate.keys.seal(&credential)?;

    tracing::info!(expires_at = %credential.expires_at, "Session established");

    let mut response = Redirect::to("/").into_response();
    append_set_cookie(
        &mut response,
        &state
            .cookies
            .build(SESSION_COOKIE, &sealed, Some(credential.remaining_secs())),
    )?;
    append_set_cookie(&mut response, &state.cookies.clear(OAUTH_STATE_COOKIE))?;
    Ok(response)
}

/// Drop the session cookie.
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<Response, HttpAppError> {
    let mut response = Html(
        "<!doctype html>\n<html lang=\"en\">\n  <head><meta charset=\"utf-8\"><title>Pictura</title></head>\n  \
<body><p>Signed out.</p><p><a href=\"/authorize\">Sign in</a></p></body>\n</html>\n",
    )
    .into_response();
    append_set_cookie(&mut response, &state.cookies.clear(SESSION_COOKIE))?;
    Ok(response)
}
