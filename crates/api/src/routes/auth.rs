//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /signup        -> signup
/// POST /login         -> login
/// GET  /status        -> status
/// POST /logout        -> logout
/// POST /refresh       -> refresh (requires auth)
/// POST /verify-email  -> verify_email
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/status", get(auth::status))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/verify-email", post(auth::verify_email))
}
