//! Domain types shared across the auth modules.
//!
//! - [`Identity`] - A user as reported by an identity provider
//! - [`RefreshTokenRecord`] - Persisted refresh token

pub mod identity;
pub mod refresh_token;

pub use identity::Identity;
pub use refresh_token::RefreshTokenRecord;
