//! Authentication service configuration.
//!
//! All sections use `#[serde(default)]` so a configuration file only needs
//! to name what differs from the defaults. Durations are written in
//! humantime form (`"10m"`, `"30d"`).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth.service]
/// service_domain = "https://auth.example.com"
/// app_domain = "https://app.example.com"
/// private_key_file = "/var/lib/tokengate/ed25519.pem"
///
/// [auth.tokens]
/// access_token_lifetime = "10m"
/// refresh_token_lifetime = "30d"
///
/// [auth.providers.google]
/// active = true
/// client_id_env = "GOOGLE_CLIENT_ID"
/// client_secret_env = "GOOGLE_CLIENT_SECRET"
///
/// [auth.store]
/// driver = "postgres"
/// connection_string = "postgres://tokengate@localhost/tokengate"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public addresses and key location.
    pub service: ServiceConfig,

    /// Token lifetimes and store deadline.
    pub tokens: TokenConfig,

    /// Cookie attributes.
    pub cookies: CookieConfig,

    /// Identity providers keyed by name (`google`, ...).
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Session store backend.
    pub store: StoreConfig,
}

/// Where the service lives and where its signing key is kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Public base URL of this service. Used for provider redirect URLs
    /// and as the domain of the refresh token cookie.
    pub service_domain: String,

    /// Public base URL of the application that consumes access tokens.
    /// The access token cookie is scoped to this domain. Empty means
    /// host-only cookies.
    pub app_domain: String,

    /// PKCS#8 PEM file holding the Ed25519 private key. Created on first
    /// start when missing.
    pub private_key_file: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_domain: "http://localhost:5875".to_string(),
            app_domain: String::new(),
            private_key_file: "tokengate_ed25519.pem".to_string(),
        }
    }
}

/// Token lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime of signed access tokens.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Lifetime of refresh token records.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Upper bound on any single session store call.
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(10 * 60),
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 60 * 60),
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Cookie settings shared by every cookie the service sets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Mark cookies `Secure`. Only disable for plain-HTTP local development.
    pub secure: bool,

    /// Lifetime of the `state` and `return_to` login flow cookies.
    #[serde(with = "humantime_serde")]
    pub flow_cookie_lifetime: Duration,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: true,
            flow_cookie_lifetime: Duration::from_secs(10 * 60),
        }
    }
}

/// One identity provider entry.
///
/// Providers with a built-in preset (`google`) only need credentials;
/// anything else must also name its endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Inactive providers are skipped when the registry is built.
    pub active: bool,

    /// OAuth client ID given inline.
    pub client_id: Option<String>,

    /// Environment variable holding the client ID.
    pub client_id_env: Option<String>,

    /// OAuth client secret given inline.
    pub client_secret: Option<String>,

    /// Environment variable holding the client secret.
    pub client_secret_env: Option<String>,

    /// Scopes to request. Empty uses the preset's scopes.
    pub scopes: Vec<String>,

    /// Authorization endpoint override.
    pub auth_url: Option<String>,

    /// Token endpoint override.
    pub token_url: Option<String>,

    /// User info endpoint override.
    pub userinfo_url: Option<String>,

    /// User info field carrying the stable user ID. Defaults to `id`.
    pub subject_field: Option<String>,

    /// User info field carrying the email address. Defaults to `email`.
    pub email_field: Option<String>,
}

/// Session store backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `memory` or `postgres`.
    pub driver: String,

    /// Connection string for database-backed drivers.
    pub connection_string: Option<String>,

    /// Connection pool size for database-backed drivers.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: "memory".to_string(),
            connection_string: None,
            max_connections: 10,
        }
    }
}

/// Longest accepted token or cookie lifetime (ten years).
pub const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Known session store drivers.
pub const STORE_DRIVERS: &[&str] = &["memory", "postgres"];

/// Providers with built-in endpoint presets.
pub const PROVIDER_PRESETS: &[&str] = &["google"];

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The service domain or private key path is empty
    /// - A token lifetime or the store timeout is zero
    /// - The refresh token does not outlive the access token
    /// - The store driver is unknown, or `postgres` has no connection string
    /// - An active provider without a preset is missing an endpoint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.service_domain.is_empty() {
            return Err(ConfigError::Missing("service.service_domain".to_string()));
        }
        if url::Url::parse(&self.service.service_domain).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "service.service_domain is not a URL: {}",
                self.service.service_domain
            )));
        }
        if self.service.private_key_file.is_empty() {
            return Err(ConfigError::Missing("service.private_key_file".to_string()));
        }

        if self.tokens.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "tokens.access_token_lifetime must be greater than 0".to_string(),
            ));
        }
        if self.tokens.refresh_token_lifetime <= self.tokens.access_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "tokens.refresh_token_lifetime must be longer than access_token_lifetime"
                    .to_string(),
            ));
        }
        for (name, lifetime) in [
            ("tokens.access_token_lifetime", self.tokens.access_token_lifetime),
            ("tokens.refresh_token_lifetime", self.tokens.refresh_token_lifetime),
            ("cookies.flow_cookie_lifetime", self.cookies.flow_cookie_lifetime),
        ] {
            if lifetime > MAX_LIFETIME {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must not exceed {} days",
                    MAX_LIFETIME.as_secs() / 86_400
                )));
            }
        }
        if self.tokens.store_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "tokens.store_timeout must be greater than 0".to_string(),
            ));
        }
        if self.cookies.flow_cookie_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "cookies.flow_cookie_lifetime must be greater than 0".to_string(),
            ));
        }

        if !STORE_DRIVERS.contains(&self.store.driver.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "unknown store driver '{}', expected one of {:?}",
                self.store.driver, STORE_DRIVERS
            )));
        }
        if self.store.driver == "postgres" {
            if self.store.connection_string.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Missing("store.connection_string".to_string()));
            }
            if self.store.max_connections == 0 {
                return Err(ConfigError::InvalidValue(
                    "store.max_connections must be greater than 0".to_string(),
                ));
            }
        }

        for (name, provider) in &self.providers {
            if !provider.active || PROVIDER_PRESETS.contains(&name.as_str()) {
                continue;
            }
            for (field, value) in [
                ("auth_url", &provider.auth_url),
                ("token_url", &provider.token_url),
                ("userinfo_url", &provider.userinfo_url),
            ] {
                if value.is_none() {
                    return Err(ConfigError::Missing(format!("providers.{name}.{field}")));
                }
            }
        }

        Ok(())
    }
}
