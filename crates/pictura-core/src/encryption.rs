//! Authenticated encryption for session cookies

use crate::AppError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{de::DeserializeOwned, Serialize};

const NONCE_LEN: usize = 12;

/// Seals small payloads (the OAuth session credential) into cookie-safe strings.
/// Uses AES-256-GCM; output is URL-safe base64 of `nonce || ciphertext`.
#[derive(Clone)]
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Create a cipher from a raw 32-byte key.
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, AppError> {
        if key_bytes.len() != 32 {
            return Err(AppError::Internal(
                "Session key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a cipher from a base64-encoded 32-byte key (the `SESSION_SECRET` format).
    pub fn from_base64(encoded: &str) -> Result<Self, AppError> {
        let key_bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Internal(format!("Failed to decode session key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Reverse of [`seal`](Self::seal). Tampered, truncated or foreign values are
    /// reported as `Unauthorized`.
    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, AppError> {
        let combined = general_purpose::URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|_| AppError::Unauthorized("Malformed session".to_string()))?;

        if combined.len() <= NONCE_LEN {
            return Err(AppError::Unauthorized("Malformed session".to_string()));
        }

        let nonce = Nonce::from_slice(&combined[..NONCE_LEN]);
        self.cipher
            .decrypt(nonce, &combined[NONCE_LEN..])
            .map_err(|_| AppError::Unauthorized("Session could not be verified".to_string()))
    }

    pub fn seal_json<T: Serialize>(&self, value: &T) -> Result<String, AppError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {}", e)))?;
        self.seal(&bytes)
    }

    pub fn open_json<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, AppError> {
        let bytes = self.open(sealed)?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Unauthorized("Session payload is invalid".to_string()))
    }
}
