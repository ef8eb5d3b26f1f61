use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "cleanride_admin";
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Proof that the caller is authenticated as the administrator. Only
/// obtainable through a valid session cookie, the bearer token, or a
/// successful login.
#[derive(Debug, Clone)]
pub struct AdminSession {
    _private: (),
}

impl AdminSession {
    /// Checks credentials and, on success, returns the session together with
    /// the signed cookie value to hand back to the browser.
    pub fn login(config: &AppConfig, username: &str, password: &str) -> Option<(Self, String)> {
        if username != config.admin_user || password != config.admin_password {
            return None;
        }
        let expires = Utc::now().timestamp() + SESSION_TTL_SECS;
        let token = sign_session(&config.session_secret, expires);
        Some((Self { _private: () }, token))
    }

    pub fn from_headers(headers: &HeaderMap, config: &AppConfig) -> Option<Self> {
        if !config.admin_token.is_empty() {
            let bearer = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            if bearer == Some(config.admin_token.as_str()) {
                return Some(Self { _private: () });
            }
        }

        let now = Utc::now().timestamp();
        session_cookie(headers)
            .filter(|value| verify_session(&config.session_secret, value, now))
            .map(|_| Self { _private: () })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, &state.config).ok_or(AppError::Unauthorized)
    }
}

pub fn session_cookie_header(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={SESSION_TTL_SECS}")
}

pub fn clear_session_cookie_header() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Cookie value: `<expiry unix seconds>.<base64url HMAC-SHA1 of "admin:<expiry>">`.
pub fn sign_session(secret: &str, expires: i64) -> String {
    let sig = session_mac(secret, expires)
        .map(|mac| {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        })
        .unwrap_or_default();
    format!("{expires}.{sig}")
}

pub fn verify_session(secret: &str, value: &str, now: i64) -> bool {
    let Some((expires_str, sig)) = value.split_once('.') else {
        return false;
    };
    let Ok(expires) = expires_str.parse::<i64>() else {
        return false;
    };
    if expires <= now {
        return false;
    }
    let Ok(sig) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(sig) else {
        return false;
    };
    match session_mac(secret, expires) {
        Some(mac) => mac.verify_slice(&sig).is_ok(),
        None => false,
    }
}

fn session_mac(secret: &str, expires: i64) -> Option<Hmac<Sha1>> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("admin:{expires}").as_bytes());
    Some(mac)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}
