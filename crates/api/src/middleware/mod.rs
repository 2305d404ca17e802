//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the caller's account and state from a JWT Bearer token.

pub mod auth;
