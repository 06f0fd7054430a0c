//! Client library for services that trust this authority.
//!
//! A [`RemoteVerifier`] fetches the verification key once at startup and
//! checks access tokens locally afterwards. The [`VerifiedClaims`]
//! extractor exposes the caller's claims to axum handlers.
//!
//! # Example
//!
//! ```ignore
//! use tokengate_auth::client::{RemoteVerifier, VerifiedClaims};
//!
//! let verifier = RemoteVerifier::connect("https://auth.example.com", vec!["google".into()]).await?;
//!
//! async fn me(VerifiedClaims(claims): VerifiedClaims) -> String {
//!     claims.email
//! }
//! ```

pub mod extract;
pub mod verifier;

pub use extract::{VerifiedClaims, token_from_parts};
pub use verifier::{ClientError, RemoteVerifier, fetch_verification_key};
