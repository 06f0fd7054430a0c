//! Authorization middleware.
//!
//! [`AuthService`] builds [`PolicyGuard`]s that wrap protected routes. Each
//! request is checked in order:
//!
//! 1. An access token must be present (`401` otherwise).
//! 2. It must verify against the service's key (`401` otherwise).
//! 3. The policy must accept the caller (`403`, or `400` for a missing
//!    path parameter).
//!
//! The verified [`AccessTokenClaims`] are then inserted into the request
//! extensions, where the [`VerifiedClaims`](crate::client::VerifiedClaims)
//! extractor picks them up without verifying twice.
//!
//! # Example
//!
//! ```ignore
//! let auth = AuthService::new(verifier, Arc::new(my_authorizer));
//!
//! let admin = auth.allow_only(["admin"]).wrap(
//!     Router::new().route("/admin/stats", get(stats)),
//! );
//! let own = auth.allow_path_val("user_id").wrap(
//!     Router::new().route("/users/{user_id}/profile", get(profile)),
//! );
//! let app = admin.merge(own);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use super::Authorizer;
use crate::client::RemoteVerifier;
use crate::client::extract::verify_parts;
use crate::token::AccessTokenClaims;
use crate::{AuthError, AuthResult};

// =============================================================================
// Policies
// =============================================================================

/// Access rule applied by a [`PolicyGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Caller's security level must be one of these, compared exactly.
    AllowOnly(HashSet<String>),
    /// Caller's attribute with this name must equal the path parameter of
    /// the same name.
    AllowPathVal(String),
}

// =============================================================================
// Service
// =============================================================================

/// Entry point for protecting routes.
#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<RemoteVerifier>,
    authorizer: Arc<dyn Authorizer>,
}

impl AuthService {
    pub fn new(verifier: Arc<RemoteVerifier>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            verifier,
            authorizer,
        }
    }

    /// Allows only callers whose level is in `levels`.
    pub fn allow_only<I, L>(&self, levels: I) -> PolicyGuard
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.guard(Policy::AllowOnly(levels.into_iter().map(Into::into).collect()))
    }

    /// Allows only callers whose `name` attribute equals the `{name}` path
    /// parameter.
    pub fn allow_path_val(&self, name: impl Into<String>) -> PolicyGuard {
        self.guard(Policy::AllowPathVal(name.into()))
    }

    fn guard(&self, policy: Policy) -> PolicyGuard {
        PolicyGuard {
            service: self.clone(),
            policy: Arc::new(policy),
        }
    }

    /// Runs the full check for one request and returns the caller's claims.
    ///
    /// # Errors
    /// - `Unauthorized` / token errors if the caller is not authenticated
    /// - `BadRequest` if a required path parameter is missing
    /// - `Forbidden` if the policy or the Authorizer rejects the caller
    /// - `Internal` for any other Authorizer failure
    pub async fn authorize(
        &self,
        policy: &Policy,
        parts: &mut Parts,
    ) -> AuthResult<AccessTokenClaims> {
        let claims = verify_parts(&self.verifier, parts)?;

        match policy {
            Policy::AllowOnly(levels) => {
                let level = self
                    .authorizer
                    .get_level(&claims.email)
                    .await
                    .map_err(authorizer_failure)?;
                if !levels.contains(&level) {
                    tracing::debug!(user_id = %claims.user_id, level = %level, "Access denied by level");
                    return Err(AuthError::forbidden(
                        "user is not allowed to access this resource",
                    ));
                }
            }
            Policy::AllowPathVal(name) => {
                let path_value = path_param(parts, name).await?;
                let value = self
                    .authorizer
                    .get_attribute(name, &claims.email)
                    .await
                    .map_err(authorizer_failure)?;
                if value != path_value {
                    tracing::debug!(user_id = %claims.user_id, attribute = %name, "Access denied by path value");
                    return Err(AuthError::forbidden(
                        "user is not allowed to access this resource",
                    ));
                }
            }
        }

        Ok(claims)
    }
}

/// Keeps Authorizer denials as `Forbidden`; anything else is a server fault.
fn authorizer_failure(err: AuthError) -> AuthError {
    match err {
        AuthError::Forbidden { .. } => err,
        other => AuthError::internal(format!("authorizer failed: {other}")),
    }
}

async fn path_param(parts: &mut Parts, name: &str) -> AuthResult<String> {
    let missing = || AuthError::bad_request(format!("{name} is not set in request path"));

    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .map_err(|_| missing())?;

    params
        .get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(missing)
}

// =============================================================================
// Guard
// =============================================================================

/// A policy bound to an [`AuthService`], used as middleware state.
#[derive(Clone)]
pub struct PolicyGuard {
    service: AuthService,
    policy: Arc<Policy>,
}

impl PolicyGuard {
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Applies this guard to every route of `router`.
    ///
    /// Installed with `route_layer`, so it runs after routing and sees the
    /// matched path parameters. Unmatched paths still fall through to `404`.
    pub fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(axum::middleware::from_fn_with_state(self, enforce))
    }
}

/// Middleware function enforcing a [`PolicyGuard`].
pub async fn enforce(
    State(guard): State<PolicyGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();
    let claims = guard.service.authorize(&guard.policy, &mut parts).await?;
    parts.extensions.insert(claims);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
