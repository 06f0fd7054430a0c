//! Token minting and verification.
//!
//! - [`keys`] - Ed25519 signing key pair, loaded or generated at startup
//! - [`jwt`] - Access token claims and the pure verification routine
//! - [`manager`] - Token Manager: refresh and access token lifecycle

pub mod jwt;
pub mod keys;
pub mod manager;

pub use jwt::{AccessTokenClaims, TokenVerifier};
pub use keys::{KeyError, SigningKeyPair};
pub use manager::TokenManager;
