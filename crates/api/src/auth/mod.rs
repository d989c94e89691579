//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session-bound JWT generation and validation.

pub mod jwt;
pub mod password;
