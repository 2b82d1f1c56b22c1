//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the caller authenticated by a JWT Bearer token.

pub mod auth;
