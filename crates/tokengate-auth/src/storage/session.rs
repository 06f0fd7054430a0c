//! Session store trait.
//!
//! # Security Considerations
//!
//! - Records are keyed by the SHA-256 hash of the token ID
//!   (see [`RefreshTokenRecord::hash_token`])
//! - An expired record must never be reported as present, whether or not
//!   it has been physically deleted

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{Identity, RefreshTokenRecord};

/// Storage trait for refresh token records.
///
/// Implementations must be safe to call concurrently from many requests.
/// Once a write has been acknowledged, subsequent reads must observe it.
///
/// # Implementations
///
/// - [`MemorySessionStore`](super::MemorySessionStore) - process-local map
/// - `tokengate-auth-postgres` - PostgreSQL storage backend
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new refresh token record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored, including when a
    /// record with the same token ID already exists.
    async fn add(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Looks up the identity bound to a token ID.
    ///
    /// Existence and expiry are evaluated together against the current
    /// time: an expired record yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn check(&self, token_id: &str) -> AuthResult<Option<Identity>>;

    /// Deletes one record.
    ///
    /// Removing a token that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, token_id: &str) -> AuthResult<()>;

    /// Deletes every record for a user, returning how many were removed.
    ///
    /// Used for security resets. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove_all_for_user(&self, user_id: &str) -> AuthResult<u64>;

    /// Releases underlying resources.
    ///
    /// The store must not be used after this returns.
    async fn close(&self);
}
