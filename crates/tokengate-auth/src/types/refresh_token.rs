//! Refresh token domain type.
//!
//! # Security
//!
//! - Token IDs carry 256 bits of entropy
//! - Stores persist the SHA-256 hash of the ID, never the ID itself
//! - Expiry is evaluated at lookup time; no sweeper is needed

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Identity;

/// Refresh token issued after a successful provider login.
///
/// The `token_id` is the opaque value handed to the browser in the
/// `refresh_token` cookie. Session stores key records by
/// [`RefreshTokenRecord::hash_token`] of that value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// Opaque token value returned to the client.
    pub token_id: String,

    /// Stable user identifier from the identity provider.
    pub user_id: String,

    /// User email address.
    pub email: String,

    /// After this instant the record must be treated as absent.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshTokenRecord {
    /// Creates a record with a freshly generated token ID.
    #[must_use]
    pub fn issue(identity: &Identity, expires_at: OffsetDateTime) -> Self {
        Self {
            token_id: Self::generate_token(),
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            expires_at,
        }
    }

    /// Returns `true` if this record has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if this record is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// The identity this record is bound to.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(&self.user_id, &self.email)
    }

    /// Hash a token value using SHA-256.
    ///
    /// Used both when storing new records and when looking them up.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generate a cryptographically secure random token.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_token() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_hash_token() {
        let hash = RefreshTokenRecord::hash_token("test-token-value");

        // SHA-256 produces 64 hex characters
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, RefreshTokenRecord::hash_token("test-token-value"));
        assert_ne!(hash, RefreshTokenRecord::hash_token("different-token"));
    }

    #[test]
    fn test_generate_token() {
        let token = RefreshTokenRecord::generate_token();

        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let mut tokens: Vec<String> = (0..100)
            .map(|_| RefreshTokenRecord::generate_token())
            .collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_issue_and_expiry() {
        let identity = Identity::new("u-1", "a@example.com");
        let now = OffsetDateTime::now_utc();

        let record = RefreshTokenRecord::issue(&identity, now + Duration::hours(1));
        assert!(!record.is_expired());
        assert_eq!(record.identity(), identity);

        let record = RefreshTokenRecord::issue(&identity, now - Duration::minutes(1));
        assert!(record.is_expired());
    }
}
