//! Pitchcraft domain types shared by the API server and the session client.
//!
//! Nothing in this crate performs I/O: it holds error types, bearer-token
//! structure checks, project validation rules, and the copy generators.

pub mod auth;
pub mod error;
pub mod generators;
pub mod project;
pub mod token;
pub mod types;
