//! Application router and middleware stack.
//!
//! The binary and the integration tests both call [`build_app_router`], so
//! tests exercise the same CORS, request-id, timeout, and token refresh
//! behaviour as production.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::middleware::refresh::{sliding_refresh, NEW_TOKEN_HEADER};
use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Build the `/api` router wrapped in the middleware stack.
///
/// Layers run outermost first:
///
/// 1. CORS (preflights never reach the handlers)
/// 2. Assign `x-request-id`
/// 3. Request/response tracing
/// 4. Echo `x-request-id` on the response
/// 5. Request timeout (408)
/// 6. Panic recovery (500)
/// 7. Sliding token refresh (`X-New-Token`)
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(build_cors_layer(config))
        // Type adapter only: CORS needs a `Default` response body.
        .layer(tower_http::map_response_body::MapResponseBodyLayer::new(axum::body::Body::new))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            sliding_refresh,
        ));

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(middleware)
        .with_state(state)
}

/// CORS for the configured frontend origins.
///
/// `X-New-Token` is exposed so browser clients can read re-issued tokens.
/// Panics at startup if a configured origin is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([NEW_TOKEN_HEADER])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
