//! # tokengate-auth
//!
//! Authentication core of the Tokengate service.
//!
//! Users sign in through an external OAuth2 provider. The service then
//! issues two credentials:
//!
//! - an opaque **refresh token**, persisted in a [`SessionStore`] and
//!   revocable at any time
//! - a short-lived Ed25519-signed **access token** (JWT), verified by any
//!   service holding the public key without contacting the issuer
//!
//! ## Modules
//!
//! - [`config`] - configuration types and validation
//! - [`token`] - key pair, access token claims, Token Manager
//! - [`storage`] - Session Store contract and in-memory store
//! - [`federation`] - identity provider adapters and registry
//! - [`oauth`] - login flow coordinator and its cookies
//! - [`http`] - axum handlers and the auth router
//! - [`client`] - Remote Verifier for services trusting this issuer
//! - [`middleware`] - authorization policies and error responses
//! - [`paths`] - endpoint paths shared by server and clients

pub mod client;
pub mod config;
pub mod error;
pub mod federation;
pub mod http;
pub mod middleware;
pub mod oauth;
pub mod paths;
pub mod storage;
pub mod token;
pub mod types;

pub use client::{ClientError, RemoteVerifier, VerifiedClaims};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use federation::{IdentityProvider, ProviderError, ProviderRegistry};
pub use http::{AuthHandlerState, auth_routes};
pub use middleware::{AuthService, Authorizer, Policy, PolicyGuard, StaticAuthorizer};
pub use oauth::{CookieSettings, LoginCoordinator};
pub use storage::{MemorySessionStore, SessionStore};
pub use token::{AccessTokenClaims, SigningKeyPair, TokenManager, TokenVerifier};
pub use types::{Identity, RefreshTokenRecord};

/// Result alias used across the crate.
pub type AuthResult<T> = Result<T, AuthError>;
