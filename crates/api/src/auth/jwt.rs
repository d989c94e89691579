//! Session-bound JWT generation and validation.
//!
//! Tokens are HS256-signed JWTs containing a [`Claims`] payload. Each token
//! names the server-side session (`sid`) it belongs to, so revoking the
//! session invalidates every token issued for it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pitchcraft_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{parse_or, required, ConfigError};

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub email: String,
    /// Session key of the `user_sessions` row this token belongs to.
    pub sid: Uuid,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

impl Claims {
    /// Whether the token expires within `window` of `now`.
    pub fn expires_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.exp - now.timestamp() <= window.num_seconds()
    }
}

/// Configuration for JWT generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in hours (default: 24).
    pub expiry_hours: i64,
    /// Authenticated requests whose token expires within this many minutes
    /// receive a fresh token (default: 60).
    pub refresh_window_mins: i64,
}

const DEFAULT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_REFRESH_WINDOW_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `JWT_SECRET`              | **yes**  | --      |
    /// | `JWT_EXPIRY_HOURS`        | no       | `24`    |
    /// | `JWT_REFRESH_WINDOW_MINS` | no       | `60`    |
    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required(lookup, "JWT_SECRET")?,
            expiry_hours: parse_or(lookup, "JWT_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS)?,
            refresh_window_mins: parse_or(
                lookup,
                "JWT_REFRESH_WINDOW_MINS",
                DEFAULT_REFRESH_WINDOW_MINS,
            )?,
        })
    }

    pub fn expiry(&self) -> Duration {
        Duration::hours(self.expiry_hours)
    }

    pub fn refresh_window(&self) -> Duration {
        Duration::minutes(self.refresh_window_mins)
    }
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Sign a token for `user_id` bound to the session `session_key`.
pub fn generate_token(
    user_id: DbId,
    email: &str,
    session_key: Uuid,
    config: &JwtConfig,
) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + config.expiry();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        sid: session_key,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(IssuedToken { token, expires_at })
}

/// Validate and decode a token, returning the embedded [`Claims`].
///
/// Checks the signature and expiration. Session revocation is checked
/// separately against the database.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.leeway = 0;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
