//! Bearer token shape checks.
//!
//! Only the structure of a token is verified here: an optional `Bearer `
//! scheme prefix followed by three dot-separated JWT segments. Signature
//! verification happens on the server. The expiry claim can be read
//! opportunistically so clients know when a refresh is due.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use regex::Regex;
use serde::Deserialize;

/// Authorization scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Three segments: header, payload, and a possibly empty signature.
const JWT_SHAPE_PATTERN: &str = r"^[A-Za-z0-9\-_=]+\.[A-Za-z0-9\-_=]+\.[A-Za-z0-9\-_.+/=]*$";

static JWT_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JWT_SHAPE_PATTERN).expect("valid regex"));

/// Why a string was rejected as a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenFormatError {
    #[error("token is empty")]
    Empty,
    #[error("token is not a three-segment JWT")]
    Malformed,
}

/// A structurally valid bearer token, stored without its scheme prefix.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    raw: String,
}

impl BearerToken {
    /// Parse a token with or without the `Bearer ` prefix.
    pub fn parse(input: &str) -> Result<Self, TokenFormatError> {
        let raw = strip_bearer(input.trim());
        if raw.is_empty() {
            return Err(TokenFormatError::Empty);
        }
        if !is_structurally_valid(raw) {
            return Err(TokenFormatError::Malformed);
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    /// The bare JWT (no scheme prefix).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized `Bearer <jwt>` form used in `Authorization` headers
    /// and persisted by token stores.
    pub fn header_value(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.raw)
    }

    /// Expiry read from the payload without verifying the signature.
    ///
    /// Returns `None` when the payload cannot be decoded or carries no `exp`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        decode_expiry(&self.raw)
    }

    /// Whether the token's own expiry lies at or before `now`.
    ///
    /// Tokens with an unreadable expiry are treated as unexpired; the server
    /// has the final word.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("raw", &"<redacted>")
            .finish()
    }
}

/// Remove a leading `Bearer ` prefix if present.
pub fn strip_bearer(value: &str) -> &str {
    value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim()
}

/// Check the three-segment JWT shape of a bare token.
pub fn is_structurally_valid(raw: &str) -> bool {
    JWT_SHAPE_RE.is_match(raw)
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

fn decode_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaim>(raw, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp, 0).single()
}
