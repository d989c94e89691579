//! Session client for the Pitchcraft API.
//!
//! - [`token_store`] -- persisted bearer token with structural validation.
//! - [`session`] -- polled authentication state, login/logout/refresh.
//! - [`guard`] -- route protection with redirect-storm suppression.
//! - [`api`] -- typed HTTP client for the auth, project, and generate endpoints.
//! - [`retry`] / [`single_flight`] -- shared async utilities.
//!
//! One [`token_store::TokenStore`] is created by the application and handed
//! to the [`api::ApiClient`], the [`session::Session`], and the
//! [`guard::RouteGuard`].

pub mod api;
pub mod backend;
pub mod error;
pub mod guard;
pub mod retry;
pub mod session;
pub mod single_flight;
pub mod token_store;
