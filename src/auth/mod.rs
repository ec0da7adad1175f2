pub mod password;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_password, PasswordError, DUMMY_HASH};

/// Session token claims. `id` is the account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(account_id: impl Into<String>, security: &SecurityConfig) -> Self {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(security.jwt_expiry.as_secs()).unwrap_or(i64::MAX);

        Self {
            id: account_id.into(),
            iat: now,
            exp: now.saturating_add(lifetime),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

/// A signed token and the lifetime it was issued with, in seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

pub fn generate_jwt(account_id: &str, security: &SecurityConfig) -> Result<IssuedToken, TokenError> {
    if security.jwt_secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let claims = Claims::new(account_id, security);
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))?;

    Ok(IssuedToken {
        token,
        expires_in: security.jwt_expiry.as_secs(),
    })
}

/// Checks signature and expiry, with no clock leeway.
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, TokenError> {
    if security.jwt_secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Invalid(e.to_string()))
}
