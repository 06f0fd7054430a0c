//! Generic OAuth2 authorization-code provider.
//!
//! The exchange has two legs: the authorization code is POSTed to the
//! token endpoint for a provider access token, which is then used as a
//! bearer credential against the user info endpoint. The user's ID and
//! email are read from configurable fields of the user info JSON.
//!
//! # Example
//!
//! ```ignore
//! use tokengate_auth::federation::{OAuthProvider, OAuthProviderSettings};
//!
//! let settings = OAuthProviderSettings::google(
//!     "client-id",
//!     "client-secret",
//!     "https://auth.example.com/auth/callback/google",
//! )?;
//! let provider = OAuthProvider::new(settings, Duration::from_secs(10))?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{IdentityProvider, ProviderError};
use crate::config::ProviderConfig;
use crate::types::Identity;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const GOOGLE_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

const DEFAULT_SUBJECT_FIELD: &str = "id";
const DEFAULT_EMAIL_FIELD: &str = "email";

/// Everything needed to talk to one provider.
#[derive(Debug, Clone)]
pub struct OAuthProviderSettings {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    pub redirect_url: Url,
    pub scopes: Vec<String>,
    pub subject_field: String,
    pub email_field: String,
    /// Extra query parameters for the consent URL.
    pub extra_auth_params: Vec<(String, String)>,
}

impl OAuthProviderSettings {
    /// Google preset.
    ///
    /// # Errors
    /// Returns an error if `redirect_url` is not a valid URL.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "google".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: Url::parse(GOOGLE_AUTH_URL)?,
            token_url: Url::parse(GOOGLE_TOKEN_URL)?,
            userinfo_url: Url::parse(GOOGLE_USERINFO_URL)?,
            redirect_url: Url::parse(redirect_url)?,
            scopes: vec![GOOGLE_EMAIL_SCOPE.to_string()],
            subject_field: DEFAULT_SUBJECT_FIELD.to_string(),
            email_field: DEFAULT_EMAIL_FIELD.to_string(),
            extra_auth_params: vec![("access_type".to_string(), "online".to_string())],
        })
    }

    /// Builds settings for `name` from its configuration entry.
    ///
    /// Known presets supply default endpoints and scopes; any endpoint
    /// given in `config` overrides the preset. Credentials are taken inline
    /// or from the environment variables named in `config`.
    ///
    /// # Errors
    /// Returns an error if a credential is missing, an endpoint is missing
    /// for a provider without a preset, or a URL does not parse.
    pub fn from_config(
        name: &str,
        config: &ProviderConfig,
        redirect_url: &str,
    ) -> Result<Self, ProviderError> {
        let client_id = resolve_credential(
            config.client_id.as_deref(),
            config.client_id_env.as_deref(),
            "client_id",
        )?;
        let client_secret = resolve_credential(
            config.client_secret.as_deref(),
            config.client_secret_env.as_deref(),
            "client_secret",
        )?;

        let mut settings = match name {
            "google" => Self::google(client_id, client_secret, redirect_url)?,
            _ => {
                let endpoint = |value: &Option<String>| -> Result<Url, ProviderError> {
                    let raw = value
                        .as_deref()
                        .ok_or_else(|| ProviderError::Unsupported(name.to_string()))?;
                    Ok(Url::parse(raw)?)
                };
                Self {
                    name: name.to_string(),
                    client_id,
                    client_secret,
                    auth_url: endpoint(&config.auth_url)?,
                    token_url: endpoint(&config.token_url)?,
                    userinfo_url: endpoint(&config.userinfo_url)?,
                    redirect_url: Url::parse(redirect_url)?,
                    scopes: Vec::new(),
                    subject_field: DEFAULT_SUBJECT_FIELD.to_string(),
                    email_field: DEFAULT_EMAIL_FIELD.to_string(),
                    extra_auth_params: Vec::new(),
                }
            }
        };

        if let Some(url) = &config.auth_url {
            settings.auth_url = Url::parse(url)?;
        }
        if let Some(url) = &config.token_url {
            settings.token_url = Url::parse(url)?;
        }
        if let Some(url) = &config.userinfo_url {
            settings.userinfo_url = Url::parse(url)?;
        }
        if !config.scopes.is_empty() {
            settings.scopes = config.scopes.clone();
        }
        if let Some(field) = &config.subject_field {
            settings.subject_field = field.clone();
        }
        if let Some(field) = &config.email_field {
            settings.email_field = field.clone();
        }

        Ok(settings)
    }
}

fn resolve_credential(
    inline: Option<&str>,
    env_var: Option<&str>,
    what: &str,
) -> Result<String, ProviderError> {
    if let Some(value) = inline.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    let Some(var) = env_var else {
        return Err(ProviderError::MissingCredential(what.to_string()));
    };
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ProviderError::MissingCredential(format!(
            "{what} (environment variable {var} is not set)"
        ))),
    }
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 error response body.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization-code provider backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    settings: OAuthProviderSettings,
    http_client: reqwest::Client,
}

impl OAuthProvider {
    /// Creates a provider whose upstream calls give up after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: OAuthProviderSettings, timeout: Duration) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            settings,
            http_client,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &OAuthProviderSettings {
        &self.settings
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.settings.redirect_url.as_str()),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
        ];

        tracing::debug!(
            provider = %self.settings.name,
            endpoint = %self.settings.token_url,
            "Exchanging authorization code"
        );

        let response = self
            .http_client
            .post(self.settings.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(ProviderError::TokenExchange(format!(
                    "{}: {}",
                    oauth_error.error,
                    oauth_error.error_description.unwrap_or_default()
                )));
            }
            return Err(ProviderError::TokenExchange(format!("HTTP {status}")));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ProviderError::TokenExchange(format!("failed to parse token response: {e}"))
        })?;
        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .http_client
            .get(self.settings.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::UserInfo(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(format!("failed to parse user info: {e}")))
    }
}

/// Reads a string-like field. Numeric IDs are rendered as decimal strings.
fn string_field(info: &serde_json::Value, field: &str) -> Result<String, ProviderError> {
    match info.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ProviderError::MissingField(field.to_string())),
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn auth_code_url(&self, state: &str) -> Url {
        let mut url = self.settings.auth_url.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.settings.client_id);
            params.append_pair("redirect_uri", self.settings.redirect_url.as_str());
            if !self.settings.scopes.is_empty() {
                params.append_pair("scope", &self.settings.scopes.join(" "));
            }
            params.append_pair("state", state);
            for (key, value) in &self.settings.extra_auth_params {
                params.append_pair(key, value);
            }
        }
        url
    }

    async fn exchange_user_info(&self, code: &str) -> Result<Identity, ProviderError> {
        let access_token = self.exchange_code(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        let user_id = string_field(&info, &self.settings.subject_field)?;
        let email = string_field(&info, &self.settings.email_field)?;
        Ok(Identity { user_id, email })
    }
}
