//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation (tokens are issued by the site's
//!   identity provider using the shared secret).

pub mod jwt;
