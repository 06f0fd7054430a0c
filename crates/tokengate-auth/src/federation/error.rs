//! Error types for identity provider operations.

/// Errors that can occur while talking to an identity provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to parse a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The token endpoint rejected the code or returned garbage.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The user info endpoint failed or returned garbage.
    #[error("User info request failed: {0}")]
    UserInfo(String),

    /// The user info response lacks a required field.
    #[error("User info is missing field: {0}")]
    MissingField(String),

    /// A client credential is not configured.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The provider has no preset and its endpoints are not configured.
    #[error("Provider '{0}' has no built-in preset and no endpoints configured")]
    Unsupported(String),
}

impl ProviderError {
    /// Converts into the coordinator-level error for `provider`.
    #[must_use]
    pub fn into_auth_error(self, provider: &str) -> crate::AuthError {
        crate::AuthError::exchange_failed(provider, self.to_string())
    }
}
