//! The server operations a [`Session`](crate::session::Session) depends on.
//!
//! [`ApiClient`](crate::api::ApiClient) is the HTTP implementation; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use pitchcraft_core::auth::{AuthStatus, Credentials, LoginResponse};
use pitchcraft_core::token::BearerToken;

use crate::error::ClientError;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /api/auth/status` with the given token.
    async fn status(&self, token: &BearerToken) -> Result<AuthStatus, ClientError>;

    /// `POST /api/auth/login`.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError>;

    /// `POST /api/auth/logout`, revoking the token's server session if any.
    async fn logout(&self, token: Option<&BearerToken>) -> Result<(), ClientError>;

    /// `POST /api/auth/refresh`. Returns the replacement token when the
    /// server issued one.
    async fn refresh(&self, token: &BearerToken) -> Result<Option<String>, ClientError>;
}
