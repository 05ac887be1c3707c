//! OAuth gate
//!
//! Browser sessions are established with the OAuth2 authorization-code flow.
//! The resulting access credential is sealed into the session cookie; there
//! is no server-side session store and no refresh.

pub mod middleware;
pub mod oauth;
pub mod session;

pub use oauth::{OAuthClient, OAuthClientConfig};
pub use session::{SessionCredential, SessionKeys};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No session credential presented")]
    MissingCredential,

    #[error("Session credential could not be verified")]
    InvalidCredential,

    #[error("Session credential expired")]
    Expired,

    #[error("OAuth state is missing, expired or does not match")]
    StateMismatch,

    #[error("Authorization was denied: {0}")]
    Denied(String),

    #[error("Authorization response carried no code")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid OAuth client configuration: {0}")]
    ClientConfig(String),
}

/// Everything the auth routes and middleware need, built once at startup.
pub struct AuthGate {
    pub oauth: OAuthClient,
    pub keys: SessionKeys,
}
