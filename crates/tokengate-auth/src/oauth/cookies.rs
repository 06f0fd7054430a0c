//! Cookies set by the auth service.
//!
//! | Cookie          | Path              | Domain         | SameSite | Lifetime        |
//! |-----------------|-------------------|----------------|----------|-----------------|
//! | `state`         | `/auth/callback`  | host only      | Lax      | flow lifetime   |
//! | `return_to`     | `/`               | host only      | Lax      | flow lifetime   |
//! | `access_token`  | `/`               | app domain     | Lax      | token expiry    |
//! | `refresh_token` | `/auth/refresh`   | service domain | Strict   | record expiry   |
//!
//! All of them are `HttpOnly`, and `Secure` unless disabled in configuration.

use cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::{AuthError, AuthResult, paths};

pub const STATE_COOKIE: &str = "state";
pub const RETURN_TO_COOKIE: &str = "return_to";
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Cookie attributes derived from configuration.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub flow_lifetime: time::Duration,
    /// `Domain` of the access token cookie.
    pub app_domain: Option<String>,
    /// `Domain` of the refresh token cookie.
    pub service_domain: Option<String>,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            flow_lifetime: time::Duration::minutes(10),
            app_domain: None,
            service_domain: None,
        }
    }
}

impl CookieSettings {
    /// # Errors
    /// Returns a configuration error if the flow cookie lifetime does not
    /// fit in a timestamp offset.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let flow_lifetime = time::Duration::try_from(config.cookies.flow_cookie_lifetime)
            .map_err(|_| AuthError::configuration("cookies.flow_cookie_lifetime is out of range"))?;
        Ok(Self {
            secure: config.cookies.secure,
            flow_lifetime,
            app_domain: cookie_domain(&config.service.app_domain),
            service_domain: cookie_domain(&config.service.service_domain),
        })
    }

    pub fn state(&self, value: &str) -> Cookie<'static> {
        Cookie::build((STATE_COOKIE, value.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path(paths::CALLBACK)
            .max_age(self.flow_lifetime)
            .build()
    }

    pub fn return_to(&self, url: &str) -> Cookie<'static> {
        Cookie::build((RETURN_TO_COOKIE, url.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.flow_lifetime)
            .build()
    }

    pub fn access_token(&self, token: &str, expires_at: OffsetDateTime) -> Cookie<'static> {
        let mut cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .expires(expires_at)
            .build();
        if let Some(domain) = &self.app_domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    pub fn refresh_token(&self, token_id: &str, expires_at: OffsetDateTime) -> Cookie<'static> {
        let mut cookie = Cookie::build((REFRESH_TOKEN_COOKIE, token_id.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path(paths::REFRESH)
            .expires(expires_at)
            .build();
        if let Some(domain) = &self.service_domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    pub fn clear_state(&self) -> Cookie<'static> {
        expired(self.state(""))
    }

    pub fn clear_return_to(&self) -> Cookie<'static> {
        expired(self.return_to(""))
    }

    pub fn clear_access_token(&self) -> Cookie<'static> {
        expired(self.access_token("", OffsetDateTime::UNIX_EPOCH))
    }

    pub fn clear_refresh_token(&self) -> Cookie<'static> {
        expired(self.refresh_token("", OffsetDateTime::UNIX_EPOCH))
    }
}

/// Turns a cookie into one that deletes itself, keeping path and domain so
/// the browser matches the original.
fn expired(mut cookie: Cookie<'static>) -> Cookie<'static> {
    cookie.set_value("");
    cookie.set_max_age(time::Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

/// Host part of a configured domain. Accepts full URLs or bare host names.
fn cookie_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match url::Url::parse(raw) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(_) => Some(raw.trim_end_matches('/').to_string()),
    }
}
