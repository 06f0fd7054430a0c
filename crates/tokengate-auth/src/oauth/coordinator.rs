//! Login flow operations.
//!
//! Each operation takes the request's [`CookieJar`] and returns the jar to
//! send back, so the HTTP layer only has to translate the outcome into a
//! redirect or status code.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use cookie::Cookie;
use serde::Deserialize;
use url::Url;

use super::cookies::{CookieSettings, REFRESH_TOKEN_COOKIE, RETURN_TO_COOKIE};
use super::state::{generate_state, verify_state};
use crate::federation::{IdentityProvider, ProviderRegistry};
use crate::token::TokenManager;
use crate::{AuthError, AuthResult};

/// Parameters the provider sends to the callback, as form fields or query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// A failed callback: the error and the cookies to send with it.
#[derive(Debug)]
pub struct CallbackRejection {
    pub jar: CookieJar,
    pub error: AuthError,
}

impl IntoResponse for CallbackRejection {
    fn into_response(self) -> Response {
        (self.jar, self.error).into_response()
    }
}

/// Coordinates provider login, token issuance and cookie handling.
pub struct LoginCoordinator {
    providers: ProviderRegistry,
    tokens: Arc<TokenManager>,
    cookies: CookieSettings,
}

impl std::fmt::Debug for LoginCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCoordinator")
            .field("providers", &self.providers)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl LoginCoordinator {
    /// Creates a coordinator.
    ///
    /// # Errors
    /// Returns a configuration error if no provider is registered.
    pub fn new(
        providers: ProviderRegistry,
        tokens: Arc<TokenManager>,
        cookies: CookieSettings,
    ) -> AuthResult<Self> {
        if providers.is_empty() {
            return Err(AuthError::configuration(
                "no identity providers available, configure at least one active provider",
            ));
        }
        Ok(Self {
            providers,
            tokens,
            cookies,
        })
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    fn provider(&self, name: &str) -> AuthResult<Arc<dyn IdentityProvider>> {
        self.providers
            .get(name)
            .ok_or_else(|| AuthError::unknown_provider(name))
    }

    /// Starts a login with `provider`.
    ///
    /// Sets the `return_to` and `state` cookies and returns the provider's
    /// consent URL.
    ///
    /// # Errors
    /// - `BadRequest` if `return_to` is missing or empty
    /// - `UnknownProvider` if `provider` is not registered
    pub fn begin_login(
        &self,
        jar: CookieJar,
        provider: &str,
        return_to: Option<&str>,
    ) -> AuthResult<(CookieJar, Url)> {
        let return_to = return_to
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AuthError::bad_request("No return_to found in request"))?;
        let provider = self.provider(provider)?;

        let state = generate_state();
        let jar = jar
            .add(self.cookies.return_to(return_to))
            .add(self.cookies.state(&state));

        tracing::debug!(provider = %provider.name(), "Redirecting to identity provider");
        Ok((jar, provider.auth_code_url(&state)))
    }

    /// Completes a login from the provider's callback.
    ///
    /// On success the access and refresh token cookies are set, the
    /// `state` and `return_to` cookies are cleared, and the return-to URL
    /// is returned. Once the state check has passed, the `state` cookie is
    /// expired whatever the outcome, so a validated value is never accepted
    /// twice.
    ///
    /// # Errors
    /// The rejection carries the jar to send back and one of:
    /// - `NoStateCookie` / `InvalidStateCookie` on a CSRF check failure
    /// - `MissingCode` if the provider sent no code
    /// - `UnknownProvider` if `provider` is not registered
    /// - `MissingReturnTo` if the `return_to` cookie is absent or empty
    /// - `ExchangeFailed` if the provider exchange fails
    /// - store and signing errors from the Token Manager
    pub async fn handle_callback(
        &self,
        jar: CookieJar,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<(CookieJar, String), CallbackRejection> {
        if let Err(error) = verify_state(&jar, params.state.as_deref()) {
            return Err(CallbackRejection { jar, error });
        }

        let jar = jar.add(self.cookies.clear_state());
        match self.complete_callback(&jar, provider, params).await {
            Ok((cookies, return_to)) => {
                let jar = cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie));
                Ok((jar, return_to))
            }
            Err(error) => Err(CallbackRejection { jar, error }),
        }
    }

    async fn complete_callback(
        &self,
        jar: &CookieJar,
        provider: &str,
        params: &CallbackParams,
    ) -> AuthResult<([Cookie<'static>; 3], String)> {
        let code = params
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)?;
        let provider = self.provider(provider)?;

        // Checked before the exchange so a missing cookie does not leave an
        // orphaned refresh token behind.
        let return_to = jar
            .get(RETURN_TO_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(AuthError::MissingReturnTo)?;

        let identity = provider.exchange_user_info(code).await.map_err(|e| {
            tracing::warn!(provider = %provider.name(), error = %e, "Provider exchange failed");
            e.into_auth_error(provider.name())
        })?;

        let refresh = self
            .tokens
            .mint_refresh_token(&identity.user_id, &identity.email)
            .await?;
        let (access_token, access_expires_at) =
            self.tokens.mint_access_token(&refresh.token_id).await?;

        tracing::info!(
            provider = %provider.name(),
            user_id = %identity.user_id,
            "User logged in"
        );
        Ok((
            [
                self.cookies.access_token(&access_token, access_expires_at),
                self.cookies.refresh_token(&refresh.token_id, refresh.expires_at),
                self.cookies.clear_return_to(),
            ],
            return_to,
        ))
    }

    /// Issues a new access token cookie from the `refresh_token` cookie.
    /// The refresh token itself is left unchanged.
    ///
    /// # Errors
    /// - `Unauthorized` if there is no refresh token cookie
    /// - `TokenInvalid` if the refresh token is unknown or expired
    /// - store and signing errors from the Token Manager
    pub async fn refresh_access_token(&self, jar: CookieJar) -> AuthResult<CookieJar> {
        let token_id = jar
            .get(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Refresh token missing"))?;

        let (access_token, expires_at) = self.tokens.mint_access_token(&token_id).await?;
        Ok(jar.add(self.cookies.access_token(&access_token, expires_at)))
    }

    /// Ends the session: revokes the refresh token named by the cookie, if
    /// any, and expires both token cookies.
    ///
    /// # Errors
    /// Returns store errors from revocation.
    pub async fn logout(&self, jar: CookieJar) -> AuthResult<CookieJar> {
        let token_id = jar
            .get(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        if let Some(token_id) = token_id {
            self.tokens.revoke_refresh_token(&token_id).await?;
            tracing::info!("Refresh token revoked on logout");
        }

        Ok(jar
            .add(self.cookies.clear_access_token())
            .add(self.cookies.clear_refresh_token()))
    }
}
