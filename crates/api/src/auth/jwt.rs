//! Session tokens.
//!
//! A login issues an HS256-signed JWT whose `jti` doubles as the
//! server-side session key. The registry in [`crate::session`] keeps the
//! set of live keys, so a token that still verifies is rejected once its
//! session has been logged out.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_SESSION_MINS: i64 = 720;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret; `JWT_SECRET`.
    pub secret: String,
    /// Session lifetime; `JWT_ACCESS_EXPIRY_MINS`, default 12 hours.
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// # Panics
    ///
    /// Panics when `JWT_SECRET` is unset or empty, or the expiry is not a
    /// number.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        let access_token_expiry_mins = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .ok()
            .map(|v| {
                v.parse()
                    .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes")
            })
            .unwrap_or(DEFAULT_SESSION_MINS);

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }
}

/// Payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    /// Session key.
    pub jti: String,
}

/// A freshly issued token and the key the registry must remember.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub session_key: String,
    pub expires_in: i64,
    /// Unix seconds; the registry drops the session after this.
    pub expires_at: i64,
}

pub fn issue_session_token(
    username: &str,
    config: &JwtConfig,
) -> Result<SessionToken, jsonwebtoken::errors::Error> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_owned(),
        iat: issued_at,
        exp: issued_at + config.lifetime_secs(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(SessionToken {
        token,
        session_key: claims.jti,
        expires_in: config.lifetime_secs(),
        expires_at: claims.exp,
    })
}

/// Check signature and expiry. Session liveness is the caller's concern.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
