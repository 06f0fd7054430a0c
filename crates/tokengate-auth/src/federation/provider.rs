//! Identity provider capability.

use async_trait::async_trait;
use url::Url;

use super::ProviderError;
use crate::types::Identity;

/// An OAuth2 identity provider.
///
/// # Implementations
///
/// - [`OAuthProvider`](super::OAuthProvider) - generic authorization-code
///   provider, with a Google preset
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registry name, also the `{provider}` path segment.
    fn name(&self) -> &str;

    /// URL of the provider's consent page carrying `state`.
    fn auth_code_url(&self, state: &str) -> Url;

    /// Exchanges an authorization code for the user's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the code exchange or the user info lookup fails.
    async fn exchange_user_info(&self, code: &str) -> Result<Identity, ProviderError>;
}
