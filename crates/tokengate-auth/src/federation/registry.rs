//! Name-keyed provider registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{IdentityProvider, OAuthProvider, OAuthProviderSettings};
use crate::config::AuthConfig;
use crate::paths;

/// Upper bound on each upstream provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Providers available for login, keyed by name.
///
/// Built once at startup and read-only afterwards.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from configuration.
    ///
    /// Inactive providers are skipped. A provider that fails to build (for
    /// example because a credential is missing) is logged and skipped so
    /// the remaining providers stay usable.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut registry = Self::new();

        for (name, provider_config) in &config.providers {
            if !provider_config.active {
                tracing::debug!(provider = %name, "Provider inactive, skipping");
                continue;
            }

            let redirect_url = paths::build_url(&config.service.service_domain, paths::CALLBACK, name);
            let provider = OAuthProviderSettings::from_config(name, provider_config, &redirect_url)
                .and_then(|settings| OAuthProvider::new(settings, PROVIDER_TIMEOUT));

            match provider {
                Ok(provider) => {
                    tracing::info!(provider = %name, "Registered identity provider");
                    registry.insert(Arc::new(provider));
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "Skipping provider");
                }
            }
        }

        registry
    }

    /// Adds a provider under its own name, replacing any previous entry.
    pub fn insert(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.insert(provider);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
