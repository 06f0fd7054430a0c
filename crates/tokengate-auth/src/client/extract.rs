//! Access token extraction for protected services.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use super::RemoteVerifier;
use crate::AuthError;
use crate::oauth::cookies::ACCESS_TOKEN_COOKIE;
use crate::token::AccessTokenClaims;

// =============================================================================
// Token lookup
// =============================================================================

/// Reads the access token from the request.
///
/// The `access_token` cookie is checked first. Non-browser callers may send
/// `Authorization: Bearer <token>` instead.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

// =============================================================================
// Extractor
// =============================================================================

/// Claims of a verified access token.
///
/// Rejects with `401 Unauthorized` when no token is present or it fails
/// verification.
///
/// # Example
///
/// ```ignore
/// async fn whoami(VerifiedClaims(claims): VerifiedClaims) -> String {
///     format!("{} <{}>", claims.user_id, claims.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct VerifiedClaims(pub AccessTokenClaims);

impl<S> FromRequestParts<S> for VerifiedClaims
where
    S: Send + Sync,
    Arc<RemoteVerifier>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Populated by the authorization middleware when it already ran.
        if let Some(claims) = parts.extensions.get::<AccessTokenClaims>() {
            return Ok(Self(claims.clone()));
        }

        let verifier = Arc::<RemoteVerifier>::from_ref(state);
        let claims = verify_parts(&verifier, parts)?;
        Ok(Self(claims))
    }
}

/// Extracts and verifies the access token carried by a request.
pub(crate) fn verify_parts(
    verifier: &RemoteVerifier,
    parts: &Parts,
) -> Result<AccessTokenClaims, AuthError> {
    let token = token_from_parts(parts)
        .ok_or_else(|| AuthError::unauthorized("user is not authenticated"))?;

    verifier.verify_token(&token).map_err(|err| match err {
        AuthError::TokenInvalid | AuthError::TokenMalformed => {
            tracing::debug!(error = %err, "Rejected access token");
            err
        }
        other => AuthError::internal(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::storage::MemorySessionStore;
    use crate::token::{SigningKeyPair, TokenManager};
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_cookie() {
        let parts = parts(Request::get("/").header("cookie", "other=1; access_token=abc"));
        assert_eq!(token_from_parts(&parts).as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_from_bearer() {
        let parts = parts(Request::get("/").header("authorization", "Bearer xyz"));
        assert_eq!(token_from_parts(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_takes_precedence() {
        let parts = parts(
            Request::get("/")
                .header("cookie", "access_token=from-cookie")
                .header("authorization", "Bearer from-header"),
        );
        assert_eq!(token_from_parts(&parts).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_no_token() {
        assert!(token_from_parts(&parts(Request::get("/"))).is_none());
        assert!(
            token_from_parts(&parts(Request::get("/").header("authorization", "Basic abc")))
                .is_none()
        );
        assert!(token_from_parts(&parts(Request::get("/").header("cookie", "access_token="))).is_none());
    }

    #[tokio::test]
    async fn test_extractor_verifies_token() {
        let keys = SigningKeyPair::generate().unwrap();
        let pem = keys.public_key_pem().to_string();
        let tokens = TokenManager::new(
            keys,
            Arc::new(MemorySessionStore::new()),
            &TokenConfig::default(),
        )
        .unwrap();
        let record = tokens.mint_refresh_token("42", "user@example.com").await.unwrap();
        let (token, _) = tokens.mint_access_token(&record.token_id).await.unwrap();

        let verifier = Arc::new(
            RemoteVerifier::from_pem("https://auth.example.com", vec!["google".into()], &pem)
                .unwrap(),
        );

        let mut ok = parts(Request::get("/").header("cookie", format!("access_token={token}")));
        let VerifiedClaims(claims) = VerifiedClaims::from_request_parts(&mut ok, &verifier)
            .await
            .unwrap();
        assert_eq!(claims.user_id, "42");
        assert_eq!(claims.email, "user@example.com");

        let mut missing = parts(Request::get("/"));
        let err = VerifiedClaims::from_request_parts(&mut missing, &verifier)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));

        let mut forged = parts(Request::get("/").header("cookie", "access_token=a.b.c"));
        let err = VerifiedClaims::from_request_parts(&mut forged, &verifier)
            .await
            .unwrap_err();
        assert!(err.is_token_error());
    }
}
