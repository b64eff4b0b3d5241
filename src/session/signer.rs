use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{AuthSession, SessionError};

/// Produces and checks tamper-evident encodings of a session
pub trait Signer: Send + Sync {
    fn sign(&self, session: &AuthSession) -> Result<String, SessionError>;
    fn verify(&self, token: &str) -> Result<AuthSession, SessionError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    key: Value,
    iat: i64,
    exp: i64,
}

/// HS256 signer. Tokens carry a key id derived from the secret, so a cookie
/// minted under another secret is rejected before its signature is checked.
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    key_id: String,
    has_secret: bool,
    ttl: Duration,
}

impl JwtSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let digest = Sha256::digest(secret);
        let key_id = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            key_id,
            has_secret: !secret.is_empty(),
            ttl: Duration::hours(24),
        }
    }

    /// How long a freshly signed session stays valid
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("key_id", &self.key_id)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Signer for JwtSigner {
    fn sign(&self, session: &AuthSession) -> Result<String, SessionError> {
        if !self.has_secret {
            return Err(SessionError::Signing("signing secret not configured".to_string()));
        }

        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Signing(format!("session lifetime {} is out of range", self.ttl)))?;
        let claims = SessionClaims {
            sub: session.username.clone(),
            key: session.key.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.key_id.clone());

        encode(&header, &claims, &self.encoding).map_err(|e| SessionError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<AuthSession, SessionError> {
        let header = decode_header(token).map_err(|e| SessionError::Malformed(e.to_string()))?;
        if header.kid.as_deref() != Some(self.key_id.as_str()) {
            return Err(SessionError::InvalidSignature);
        }

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => SessionError::InvalidSignature,
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Malformed(e.to_string()),
        })?;

        Ok(AuthSession {
            username: data.claims.sub,
            key: data.claims.key,
        })
    }
}
