use axum::routing::post;
use axum::Router;

use crate::handlers::generate;
use crate::state::AppState;

/// Routes mounted at `/generate`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate::generate))
}
