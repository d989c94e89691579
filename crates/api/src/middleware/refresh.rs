//! Sliding token refresh.
//!
//! Successful authenticated responses whose token is close to expiry carry a
//! replacement token in the `X-New-Token` header. The session row is extended
//! to match the new expiry.

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use pitchcraft_core::types::DbId;
use pitchcraft_db::repositories::SessionRepo;
use uuid::Uuid;

use crate::auth::jwt::{generate_token, IssuedToken};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{bearer_token, decode_claims};
use crate::state::AppState;

/// Response header carrying a replacement token.
pub const NEW_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-new-token");

/// Sign a new token for an existing session and push the session's expiry out.
///
/// Returns `None` if the session has been revoked in the meantime.
pub async fn reissue_token(
    state: &AppState,
    user_id: DbId,
    email: &str,
    session_key: Uuid,
) -> AppResult<Option<IssuedToken>> {
    let issued = generate_token(user_id, email, session_key, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    if !SessionRepo::extend(&state.pool, session_key, issued.expires_at).await? {
        return Ok(None);
    }
    Ok(Some(issued))
}

/// Attach `token` to `response` as `X-New-Token`.
pub fn attach_new_token(response: &mut Response, token: &str) {
    if let Ok(value) = HeaderValue::from_str(token) {
        response.headers_mut().insert(NEW_TOKEN_HEADER, value);
    }
}

/// Middleware issuing a fresh token when the presented one is about to expire.
pub async fn sliding_refresh(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(request.headers())
        .ok()
        .flatten()
        .and_then(|token| decode_claims(&state, &token).ok());

    let mut response = next.run(request).await;

    let Some(claims) = claims else {
        return response;
    };
    if !response.status().is_success() || response.headers().contains_key(NEW_TOKEN_HEADER) {
        return response;
    }
    if !claims.expires_within(state.config.jwt.refresh_window(), Utc::now()) {
        return response;
    }

    match reissue_token(&state, claims.sub, &claims.email, claims.sid).await {
        Ok(Some(issued)) => {
            tracing::debug!(user_id = claims.sub, "Issued sliding refresh token");
            attach_new_token(&mut response, &issued.token);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Sliding token refresh failed"),
    }
    response
}
