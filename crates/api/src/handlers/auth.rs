//! Handlers for the `/auth` resource (signup, login, status, logout, refresh,
//! email verification).

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitchcraft_core::auth::{AuthStatus, Credentials, LoginResponse, SessionUser, SignupResponse};
use pitchcraft_core::error::CoreError;
use pitchcraft_core::types::DbId;
use pitchcraft_db::models::session::CreateSession;
use pitchcraft_db::models::user::CreateUser;
use pitchcraft_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{authenticate, bearer_token, decode_claims, AuthUser};
use crate::middleware::refresh::{attach_new_token, reissue_token};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/verify-email`.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup
///
/// Create an account, log the verification link, and open a session.
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<Credentials>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let email = input.normalized_email();

    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "An account with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let verification_token = Uuid::new_v4().simple().to_string();

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email,
            password_hash,
            verification_token: Some(verification_token.clone()),
        },
    )
    .await?;

    tracing::info!(
        user_id = user.id,
        verification_url = %format!("{}/verify-email?token={verification_token}", state.config.app_url),
        "User signed up; email verification pending"
    );

    let token = open_session(&state, user.id, &user.email, user_agent(&headers)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            token,
            message: "Account created. Check your email to verify your address.".into(),
            user_id: user.id,
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email + password and open a new session.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = input.email.trim().to_lowercase();
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        ))
    };

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = open_session(&state, user.id, &user.email, user_agent(&headers)).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}

/// GET /api/auth/status
///
/// No `Authorization` header is a normal anonymous answer (200). A header
/// carrying a bad, expired, or revoked token is a 401.
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let token = match bearer_token(&headers) {
        Ok(None) => return Ok(Json(AuthStatus::default()).into_response()),
        Ok(Some(token)) => token,
        Err(e) => return Ok(unauthenticated(e)),
    };

    let auth = match authenticate(&state, &token).await {
        Ok(auth) => auth,
        Err(AppError::Core(e)) => return Ok(unauthenticated(AppError::Core(e))),
        Err(e) => return Err(e),
    };

    let Some(user) = UserRepo::find_by_id(&state.pool, auth.user_id).await? else {
        return Ok(unauthenticated(AppError::Core(CoreError::Unauthorized(
            "User no longer exists".into(),
        ))));
    };

    Ok(Json(AuthStatus::authenticated(SessionUser::from(&user))).into_response())
}

/// POST /api/auth/logout
///
/// Revoke the presented token's session, if any. Always succeeds.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<OkResponse>> {
    let claims = bearer_token(&headers)
        .ok()
        .flatten()
        .and_then(|token| decode_claims(&state, &token).ok());

    if let Some(claims) = claims {
        let revoked = SessionRepo::revoke_by_key(&state.pool, claims.sid).await?;
        tracing::info!(user_id = claims.sub, revoked, "User logged out");
    }

    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/auth/refresh
///
/// Exchange a valid token for a new one on the same session. The new token is
/// returned in the body and in `X-New-Token`.
pub async fn refresh(State(state): State<AppState>, auth: AuthUser) -> AppResult<Response> {
    let issued = reissue_token(&state, auth.user_id, &auth.email, auth.session_key)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Session has been revoked or has expired".into(),
            ))
        })?;

    let mut response = Json(TokenResponse {
        token: issued.token.clone(),
    })
    .into_response();
    attach_new_token(&mut response, &issued.token);
    Ok(response)
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<VerifyEmailRequest>,
) -> AppResult<Json<OkResponse>> {
    let user = UserRepo::verify_email(&state.pool, input.token.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Verification token not found".into()))?;

    tracing::info!(user_id = user.id, "Email verified");
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a session row and sign its first token.
async fn open_session(
    state: &AppState,
    user_id: DbId,
    email: &str,
    user_agent: Option<String>,
) -> AppResult<String> {
    let session_key = Uuid::new_v4();
    let issued = generate_token(user_id, email, session_key, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id,
            session_key,
            expires_at: issued.expires_at,
            user_agent,
        },
    )
    .await?;

    Ok(issued.token)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `401 {authenticated: false, error}` for the status endpoint.
fn unauthenticated(err: AppError) -> Response {
    let message = match err {
        AppError::Core(CoreError::Unauthorized(msg)) => msg,
        other => other.to_string(),
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthStatus::rejected(message)),
    )
        .into_response()
}
