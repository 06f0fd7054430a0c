//! External identity provider federation.
//!
//! A provider turns an OAuth2 authorization code into an [`Identity`].
//! Providers are collected into a [`ProviderRegistry`] at startup and looked
//! up by name for every login.
//!
//! [`Identity`]: crate::types::Identity

pub mod error;
pub mod oauth2;
pub mod provider;
pub mod registry;

pub use error::ProviderError;
pub use oauth2::{OAuthProvider, OAuthProviderSettings};
pub use provider::IdentityProvider;
pub use registry::ProviderRegistry;
