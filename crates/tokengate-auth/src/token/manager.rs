//! Token Manager.
//!
//! Owns the signing key pair and the session store. Refresh tokens are
//! opaque IDs checked against the store on every use; access tokens are
//! signed JWTs that anyone holding the public key can verify.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use super::jwt::{self, AccessTokenClaims, TokenVerifier};
use super::keys::SigningKeyPair;
use crate::config::TokenConfig;
use crate::storage::SessionStore;
use crate::types::{Identity, RefreshTokenRecord};
use crate::{AuthError, AuthResult};

/// Mints and verifies refresh and access tokens.
///
/// Constructed once at startup and shared behind an `Arc`. Nothing in it
/// is mutable after construction.
pub struct TokenManager {
    keys: SigningKeyPair,
    verifier: TokenVerifier,
    store: Arc<dyn SessionStore>,
    access_ttl: time::Duration,
    refresh_ttl: time::Duration,
    store_timeout: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a manager from a key pair, a store and token settings.
    ///
    /// # Errors
    /// Returns a configuration error if the key pair's public key cannot be
    /// decoded or a lifetime does not fit in a timestamp offset.
    pub fn new(
        keys: SigningKeyPair,
        store: Arc<dyn SessionStore>,
        config: &TokenConfig,
    ) -> AuthResult<Self> {
        let verifier = keys.verifier()?;
        let access_ttl = to_time_duration(config.access_token_lifetime, "access_token_lifetime")?;
        let refresh_ttl = to_time_duration(config.refresh_token_lifetime, "refresh_token_lifetime")?;

        Ok(Self {
            keys,
            verifier,
            store,
            access_ttl,
            refresh_ttl,
            store_timeout: config.store_timeout,
        })
    }

    /// Issues a refresh token for a user and persists its record.
    ///
    /// # Errors
    /// Store failures are propagated unchanged.
    pub async fn mint_refresh_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> AuthResult<RefreshTokenRecord> {
        let identity = Identity::new(user_id, email);
        let expires_at = expiry_after(OffsetDateTime::now_utc(), self.refresh_ttl)?;
        let record = RefreshTokenRecord::issue(&identity, expires_at);

        self.store_call("add", self.store.add(&record)).await?;
        tracing::info!(user_id = %user_id, "Issued refresh token");
        Ok(record)
    }

    /// Issues a signed access token for the identity bound to a refresh
    /// token. Returns the token and its expiry.
    ///
    /// # Errors
    /// - Any error from [`verify_refresh_token`](Self::verify_refresh_token)
    /// - `Internal` if signing fails
    pub async fn mint_access_token(
        &self,
        refresh_token_id: &str,
    ) -> AuthResult<(String, OffsetDateTime)> {
        let identity = self.verify_refresh_token(refresh_token_id).await?;

        let now = OffsetDateTime::now_utc();
        let expires_at = expiry_after(now, self.access_ttl)?;
        let claims = AccessTokenClaims::new(&identity, now, expires_at);
        let token = jwt::sign(&self.keys, &claims)?;

        tracing::debug!(user_id = %identity.user_id, "Issued access token");
        Ok((token, expires_at))
    }

    /// Resolves a refresh token to its identity.
    ///
    /// # Errors
    /// - `TokenInvalid` if the token is unknown or expired
    /// - `Storage` if the store fails or times out
    pub async fn verify_refresh_token(&self, token_id: &str) -> AuthResult<Identity> {
        self.store_call("check", self.store.check(token_id))
            .await?
            .ok_or(AuthError::TokenInvalid)
    }

    /// Verifies an access token locally against the public key.
    ///
    /// # Errors
    /// - `TokenMalformed` if the input is not a JWT
    /// - `TokenInvalid` if signature, algorithm or expiry checks fail
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        self.verifier.verify(token)
    }

    /// Revokes a single refresh token. Unknown tokens are ignored.
    pub async fn revoke_refresh_token(&self, token_id: &str) -> AuthResult<()> {
        self.store_call("remove", self.store.remove(token_id)).await
    }

    /// Revokes every refresh token of a user.
    ///
    /// Access tokens already issued stay valid until they expire.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> AuthResult<u64> {
        let removed = self
            .store_call("remove_all_for_user", self.store.remove_all_for_user(user_id))
            .await?;
        tracing::warn!(user_id = %user_id, removed, "Revoked all refresh tokens for user");
        Ok(removed)
    }

    /// PEM `PUBLIC KEY` block for the signing key.
    #[must_use]
    pub fn public_key_pem(&self) -> &str {
        self.keys.public_key_pem()
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_token_lifetime(&self) -> time::Duration {
        self.access_ttl
    }

    /// Releases the session store.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn store_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<T> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(operation, timeout = ?self.store_timeout, "Session store call timed out");
                Err(AuthError::storage(format!(
                    "session store {operation} timed out after {:?}",
                    self.store_timeout
                )))
            }
        }
    }
}

fn expiry_after(now: OffsetDateTime, ttl: time::Duration) -> AuthResult<OffsetDateTime> {
    now.checked_add(ttl)
        .ok_or_else(|| AuthError::internal("token expiry is out of range"))
}

fn to_time_duration(duration: Duration, name: &str) -> AuthResult<time::Duration> {
    time::Duration::try_from(duration)
        .map_err(|_| AuthError::configuration(format!("{name} is out of range")))
}
