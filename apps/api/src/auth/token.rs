//! Session tokens: HS512-signed JWTs carrying `sub` (username), `iat` and `exp`.
//!
//! Validation is a pure function of the token, the immutable key and the clock.
//! The signature is checked before any claim is trusted; the validity window
//! `[iat, exp)` is checked against the injected clock, not the library's.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;
use crate::errors::AppError;

const ALGORITHM: Algorithm = Algorithm::HS512;
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::Expired,
            TokenError::Malformed => AppError::Malformed,
            TokenError::BadSignature => AppError::BadSignature,
            TokenError::Signing(e) => AppError::Internal(anyhow::anyhow!("token signing failed: {e}")),
            TokenError::ExpiryOutOfRange => {
                AppError::Internal(anyhow::anyhow!("token expiry is out of range"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued token in the shape the login response carries.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// `secret` is the raw HMAC key.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // The window is checked against `clock` in `validate`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }

    /// Signs a token for `username`, valid from now for the configured TTL.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.ttl.num_seconds(),
            expires_at,
        })
    }

    /// Returns the token's subject if the signature verifies and `now` is inside `[iat, exp)`.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        let now = self.clock.now().timestamp();
        if now < claims.iat || now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header value.
    pub fn bearer(header_value: &str) -> Result<&str, TokenError> {
        header_value
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::Malformed)
    }
}
