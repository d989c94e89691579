//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use pitchcraft_core::error::CoreError;
use pitchcraft_core::token::BearerToken;
use pitchcraft_core::types::DbId;
use pitchcraft_db::repositories::SessionRepo;
use uuid::Uuid;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// The token must carry a valid signature, be unexpired, and belong to a
/// session that has not been revoked.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub email: String,
    /// Session the presented token belongs to.
    pub session_key: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;
        authenticate(state, &token).await
    }
}

/// Read the bearer token from `Authorization`, if the header is present.
///
/// A present but malformed header is an error, distinct from an absent one.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<Option<BearerToken>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization header".into(),
        ))
    })?;

    if !value.starts_with(pitchcraft_core::token::BEARER_PREFIX) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        )));
    }

    BearerToken::parse(value)
        .map(Some)
        .map_err(|e| AppError::Core(CoreError::Unauthorized(format!("Invalid token: {e}"))))
}

/// Verify a token's signature and expiry. Does not consult the database.
pub fn decode_claims(state: &AppState, token: &BearerToken) -> AppResult<Claims> {
    validate_token(token.raw(), &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))
}

/// Fully authenticate a token: signature, expiry, and an active session.
pub async fn authenticate(state: &AppState, token: &BearerToken) -> AppResult<AuthUser> {
    let claims = decode_claims(state, token)?;

    SessionRepo::find_active_by_key(&state.pool, claims.sid)
        .await?
        .filter(|session| session.user_id == claims.sub)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Session has been revoked or has expired".into(),
            ))
        })?;

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        session_key: claims.sid,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn absent_header_is_none() {
        assert_matches!(bearer_token(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_header_is_parsed() {
        let token = bearer_token(&headers("Bearer aaa.bbb.ccc")).unwrap().unwrap();
        assert_eq!(token.raw(), "aaa.bbb.ccc");
    }

    #[test]
    fn other_scheme_is_rejected() {
        assert_matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_matches!(
            bearer_token(&headers("Bearer not-a-jwt")),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }
}
