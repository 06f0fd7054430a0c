//! Remote Verifier.
//!
//! Verification latency and availability are decoupled from the issuing
//! service: after the key is fetched no request ever goes back to it. The
//! flip side is that an access token stays valid for its whole lifetime
//! even if its refresh token is revoked in the meantime.

use std::time::Duration;

use crate::AuthResult;
use crate::paths;
use crate::token::{AccessTokenClaims, KeyError, TokenVerifier};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while setting up a [`RemoteVerifier`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no auth domain provided")]
    MissingDomain,

    #[error("no identity providers provided")]
    NoProviders,

    #[error("failed to fetch verification key: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected status code fetching verification key: {0}")]
    Status(u16),

    #[error("verification key is not usable: {0}")]
    Key(#[from] KeyError),
}

/// Fetches the PEM verification key from an auth service.
///
/// # Errors
/// Returns an error if the request fails or the service does not answer
/// `200 OK`.
pub async fn fetch_verification_key(service_domain: &str) -> Result<String, ClientError> {
    let url = format!(
        "{}{}",
        service_domain.trim_end_matches('/'),
        paths::VERIFICATION_KEY
    );
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(ClientError::Status(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

/// Verifies access tokens issued by a remote auth service.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    service_domain: String,
    providers: Vec<String>,
    verifier: TokenVerifier,
}

impl RemoteVerifier {
    /// Fetches the verification key from `service_domain` and builds a
    /// verifier. Fails if the key cannot be fetched or decoded; there is
    /// no fallback.
    ///
    /// # Errors
    /// - `MissingDomain` / `NoProviders` on empty arguments
    /// - `Fetch` / `Status` if the key cannot be retrieved
    /// - `Key` if the response is not an Ed25519 public key
    pub async fn connect(
        service_domain: impl Into<String>,
        providers: Vec<String>,
    ) -> Result<Self, ClientError> {
        let service_domain = service_domain.into();
        check_args(&service_domain, &providers)?;

        let pem = fetch_verification_key(&service_domain).await?;
        let verifier = TokenVerifier::from_pem(&pem)?;
        tracing::info!(service = %service_domain, "Fetched verification key");

        Ok(Self {
            service_domain,
            providers,
            verifier,
        })
    }

    /// Builds a verifier from a key distributed out of band.
    ///
    /// # Errors
    /// Same argument and key errors as [`connect`](Self::connect).
    pub fn from_pem(
        service_domain: impl Into<String>,
        providers: Vec<String>,
        public_key_pem: &str,
    ) -> Result<Self, ClientError> {
        let service_domain = service_domain.into();
        check_args(&service_domain, &providers)?;

        Ok(Self {
            service_domain,
            providers,
            verifier: TokenVerifier::from_pem(public_key_pem)?,
        })
    }

    /// Verifies an access token locally.
    ///
    /// # Errors
    /// - `TokenMalformed` if the input is not a JWT
    /// - `TokenInvalid` if signature, algorithm or expiry checks fail
    pub fn verify_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        self.verifier.verify(token)
    }

    /// Login URL for each configured provider, in configuration order.
    #[must_use]
    pub fn login_urls(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| paths::build_url(&self.service_domain, paths::LOGIN, provider))
            .collect()
    }

    #[must_use]
    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }
}

fn check_args(service_domain: &str, providers: &[String]) -> Result<(), ClientError> {
    if service_domain.is_empty() {
        return Err(ClientError::MissingDomain);
    }
    if providers.is_empty() {
        return Err(ClientError::NoProviders);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthError;
    use crate::token::SigningKeyPair;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn providers() -> Vec<String> {
        vec!["google".to_string(), "corp".to_string()]
    }

    #[tokio::test]
    async fn test_connect_fetches_key() {
        let keys = SigningKeyPair::generate().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/verification-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(keys.public_key_pem()))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = RemoteVerifier::connect(server.uri(), providers())
            .await
            .unwrap();

        // Verification is local: the mock expects exactly one request.
        for _ in 0..3 {
            let err = verifier.verify_token("not-a-jwt").unwrap_err();
            assert!(matches!(err, AuthError::TokenMalformed));
        }
    }

    #[tokio::test]
    async fn test_connect_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/verification-key"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = RemoteVerifier::connect(server.uri(), providers())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status(500)));
    }

    #[tokio::test]
    async fn test_connect_fails_on_bad_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/verification-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a pem"))
            .mount(&server)
            .await;

        let err = RemoteVerifier::connect(server.uri(), providers())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Key(_)));
    }

    #[test]
    fn test_argument_checks() {
        let pem = SigningKeyPair::generate().unwrap().public_key_pem().to_string();
        assert!(matches!(
            RemoteVerifier::from_pem("", providers(), &pem),
            Err(ClientError::MissingDomain)
        ));
        assert!(matches!(
            RemoteVerifier::from_pem("https://auth.example.com", vec![], &pem),
            Err(ClientError::NoProviders)
        ));
    }

    #[test]
    fn test_login_urls() {
        let pem = SigningKeyPair::generate().unwrap().public_key_pem().to_string();
        let verifier = RemoteVerifier::from_pem("https://auth.example.com", providers(), &pem).unwrap();
        assert_eq!(
            verifier.login_urls(),
            vec![
                "https://auth.example.com/auth/login/google",
                "https://auth.example.com/auth/login/corp",
            ]
        );
    }
}
