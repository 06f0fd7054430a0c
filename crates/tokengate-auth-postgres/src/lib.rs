//! PostgreSQL session store for Tokengate.
//!
//! Refresh token records live in a single `tokengate_sessions` table keyed
//! by the SHA-256 hash of the token ID. Expiry is evaluated by the database
//! clock in the same statement as the lookup.
//!
//! # Example
//!
//! ```ignore
//! use tokengate_auth_postgres::PostgresSessionStore;
//!
//! let store = PostgresSessionStore::connect("postgres://localhost/tokengate", 10).await?;
//! store.migrate().await?;
//! ```

pub mod session;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

use tokengate_auth::AuthError;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use session::PostgresSessionStore;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised by the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// A record with the same key already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::storage(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
