pub mod auth;
pub mod generate;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /health                  service + database health (GET)
///
/// /auth/signup             create account (POST)
/// /auth/login              open session (POST)
/// /auth/status             current session (GET)
/// /auth/logout             revoke session (POST)
/// /auth/refresh            reissue token (POST)
/// /auth/verify-email       confirm email address (POST)
///
/// /projects                list, create
/// /projects/{id}           get, update, delete
///
/// /generate                render marketing copy (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/generate", generate::router())
}
