//! Bearer token issuing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failures of the auth gate, before any engine call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization token missing")]
    MissingCredential,
    #[error("authorization token invalid")]
    InvalidCredential,
    #[error("user not found")]
    UnknownUser,
    #[error("account is inactive")]
    Inactive,
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MissingCredential",
            Self::InvalidCredential => "InvalidCredential",
            Self::UnknownUser => "UnknownUser",
            Self::Inactive => "InactiveAccount",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 keys plus token lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Sign a token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Check signature and expiry, returning the subject.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|err| {
                tracing::debug!("token rejected: {err}");
                AuthError::InvalidCredential
            })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidCredential)
    }
}
