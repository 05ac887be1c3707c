use super::{AuthError, AuthGate};
use crate::error::HttpAppError;
use crate::utils::cookies::{read_cookie, SESSION_COOKIE};
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Sealed credential from `Authorization: Bearer` or the session cookie.
fn presented_credential(request: &Request) -> Option<String> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| read_cookie(request.headers(), SESSION_COOKIE))
}

/// Require a valid, unexpired session credential. Page loads are sent to
/// `/authorize`; everything else gets a 401.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = presented_credential(&request)
        .ok_or(AuthError::MissingCredential)
        .and_then(|sealed| gate.keys.open(&sealed));

    match result {
        Ok(credential) => {
            request.extensions_mut().insert(credential);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                error = %err,
                method = %request.method(),
                path = %request.uri().path(),
                "Request not authenticated"
            );
            if matches!(*request.method(), Method::GET | Method::HEAD) {
                Redirect::to("/authorize").into_response()
            } else {
                HttpAppError::from(err).into_response()
            }
        }
    }
}
