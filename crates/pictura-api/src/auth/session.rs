//! Session credential sealing and OAuth `state` signing

use super::AuthError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pictura_core::{AppError, SessionCipher};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// OAuth `state` tokens are accepted for ten minutes.
pub const STATE_TTL_SECS: i64 = 600;

const STATE_KEY_CONTEXT: &[u8] = b"pictura-oauth-state";

/// Access credential obtained from the token endpoint, carried in the
/// session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Keys derived from `SESSION_SECRET`.
#[derive(Clone)]
pub struct SessionKeys {
    cipher: SessionCipher,
    state_key: Vec<u8>,
}

impl SessionKeys {
    pub fn from_secret(session_secret: &str) -> Result<Self, AppError> {
        let cipher = SessionCipher::from_base64(session_secret)?;

        let mut hasher = Sha256::new();
        hasher.update(STATE_KEY_CONTEXT);
        hasher.update(session_secret.trim().as_bytes());
        let state_key = hasher.finalize().to_vec();

        Ok(Self { cipher, state_key })
    }

    pub fn seal(&self, credential: &SessionCredential) -> Result<String, AppError> {
        self.cipher.seal_json(credential)
    }

    /// Decrypt a sealed credential and reject it once expired.
    pub fn open(&self, sealed: &str) -> Result<SessionCredential, AuthError> {
        let credential: SessionCredential = self
            .cipher
            .open_json(sealed)
            .map_err(|_| AuthError::InvalidCredential)?;

        if credential.is_expired() {
            return Err(AuthError::Expired);
        }
        Ok(credential)
    }

    /// Fresh `state` value: `<hmac>.<timestamp>.<nonce>`.
    pub fn sign_state(&self) -> Result<String, AppError> {
        self.sign_state_at(Utc::now().timestamp())
    }

    fn sign_state_at(&self, timestamp: i64) -> Result<String, AppError> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let message = format!("{}.{}", timestamp, nonce);
        let signature = self
            .mac(&message)
            .map_err(|e| AppError::Internal(format!("Failed to sign OAuth state: {}", e)))?;
        Ok(format!("{}.{}", signature, message))
    }

    /// Check signature and age of a `state` value.
    pub fn verify_state(&self, token: &str) -> bool {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return false;
        }

        let timestamp = match parts[1].parse::<i64>() {
            Ok(ts) => ts,
            Err(_) => return false,
        };

        let age = Utc::now().timestamp() - timestamp;
        if !(0..=STATE_TTL_SECS).contains(&age) {
            tracing::debug!(age_secs = age, "OAuth state expired");
            return false;
        }

        let expected = match self.mac(&format!("{}.{}", parts[1], parts[2])) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        constant_time_eq(&expected, parts[0])
    }

    fn mac(&self, message: &str) -> Result<String, hmac::digest::InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(&self.state_key)?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
