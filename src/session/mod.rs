pub mod signer;

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use signer::{JwtSigner, Signer};

/// Name of the cookie carrying the signed session
pub const COOKIE_NAME: &str = "auth";

/// Session cookie errors. None of these are fatal; a request carrying a bad
/// cookie is simply unauthenticated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no session cookie")]
    Missing,

    #[error("malformed session cookie: {0}")]
    Malformed(String),

    #[error("session signature is invalid")]
    InvalidSignature,

    #[error("session has expired")]
    Expired,

    #[error("unable to sign session: {0}")]
    Signing(String),
}

/// Identity claim carried by an authenticated request. Rebuilt from the
/// cookie on every request and never stored server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub username: String,
    pub key: Value,
}

impl AuthSession {
    pub fn new(username: impl Into<String>, key: impl Into<Value>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }

    /// Sign the session and set it as the `auth` cookie on a response
    pub fn attach(&self, signer: &dyn Signer, headers: &mut HeaderMap) -> Result<(), SessionError> {
        let token = signer.sign(self)?;
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, token);
        let value = HeaderValue::from_str(&cookie).map_err(|e| SessionError::Signing(e.to_string()))?;
        headers.append(SET_COOKIE, value);
        Ok(())
    }

    /// Overwrite the `auth` cookie with an empty value
    pub fn clear(headers: &mut HeaderMap) {
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("auth=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
        );
    }

    /// Recover the session from a request's cookies
    pub fn from_headers(signer: &dyn Signer, headers: &HeaderMap) -> Result<Self, SessionError> {
        let token = cookie_value(headers, COOKIE_NAME).ok_or(SessionError::Missing)?;
        if token.is_empty() {
            return Err(SessionError::Missing);
        }
        signer.verify(token)
    }

    /// Like `from_headers`, but any failure just means "not authenticated"
    pub fn from_request(signer: &dyn Signer, headers: &HeaderMap) -> Option<Self> {
        match Self::from_headers(signer, headers) {
            Ok(session) => Some(session),
            Err(SessionError::Missing) => None,
            Err(e) => {
                tracing::warn!("rejecting session cookie: {}", e);
                None
            }
        }
    }
}

/// Find a cookie by name across all `Cookie` headers
fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}
