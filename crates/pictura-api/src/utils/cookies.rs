//! Cookie helpers
//!
//! Only the handful of cookies this service sets are handled here, so a full
//! cookie jar is not needed.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use pictura_core::AppError;

pub const SESSION_COOKIE: &str = "pictura_session";
pub const OAUTH_STATE_COOKIE: &str = "pictura_oauth_state";
pub const FLASH_COOKIE: &str = "pictura_flash";

/// Attributes shared by every cookie the service sets.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// `Set-Cookie` value for `name=value`. `max_age_secs` of `None` makes a
    /// session cookie.
    pub fn build(&self, name: &str, value: &str, max_age_secs: Option<i64>) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
        if let Some(max_age) = max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age.max(0)));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn clear(&self, name: &str) -> String {
        self.build(name, "", Some(0))
    }
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn append_set_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
