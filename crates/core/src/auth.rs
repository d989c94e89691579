//! Account payloads shared by the auth endpoints and the session client.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::DbId;

/// Email + password pair sent to `/api/auth/login` and `/api/auth/signup`.
///
/// Signup runs the full [`Validate`] rules; login only requires both
/// fields to be non-empty.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Lowercased, trimmed email used for lookups and storage.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The authenticated user as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: DbId,
    pub email: String,
    pub email_verified: bool,
}

/// Body of `GET /api/auth/status`. Optional fields are omitted when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user.id),
            email: Some(user.email),
            email_verified: Some(user.email_verified),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The session user, when the status is authenticated and complete.
    pub fn user(&self) -> Option<SessionUser> {
        if !self.authenticated {
            return None;
        }
        Some(SessionUser {
            id: self.user_id?,
            email: self.email.clone()?,
            email_verified: self.email_verified.unwrap_or(false),
        })
    }
}

/// Body of a successful `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: DbId,
}

/// Body of a successful `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub token: String,
    pub message: String,
    pub user_id: DbId,
}
