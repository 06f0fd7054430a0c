//! Session store backed by PostgreSQL.

use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use tracing::{debug, info, instrument};

use tokengate_auth::{AuthResult, Identity, RefreshTokenRecord, SessionStore};

use crate::{PgPool, StorageError, StorageResult};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Refresh token records in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection fails.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL session store");
        Ok(Self::new(pool))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the sessions table and its indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        query(
            r#"
            CREATE TABLE IF NOT EXISTS tokengate_sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                email TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // "Log out everywhere" deletes by user
        query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_tokengate_sessions_user_id
            ON tokengate_sessions(user_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_tokengate_sessions_expires_at
            ON tokengate_sessions(expires_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Session table ready");
        Ok(())
    }

    /// Deletes records whose expiry has passed. Lookups already ignore
    /// them, so this only reclaims space.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn purge_expired(&self) -> StorageResult<u64> {
        let result = query("DELETE FROM tokengate_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, record: &RefreshTokenRecord) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO tokengate_sessions (token_hash, user_id, email, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(RefreshTokenRecord::hash_token(&record.token_id))
        .bind(&record.user_id)
        .bind(&record.email)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict("refresh token already exists");
            }
            StorageError::from(e)
        })?;
        Ok(())
    }

    async fn find(&self, token_id: &str) -> StorageResult<Option<Identity>> {
        let row: Option<(String, String)> = query_as(
            r#"
            SELECT user_id, email
            FROM tokengate_sessions
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(RefreshTokenRecord::hash_token(token_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, email)| Identity::new(user_id, email)))
    }

    async fn delete(&self, token_id: &str) -> StorageResult<()> {
        query("DELETE FROM tokengate_sessions WHERE token_hash = $1")
            .bind(RefreshTokenRecord::hash_token(token_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str) -> StorageResult<u64> {
        let result = query("DELETE FROM tokengate_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn add(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        Ok(self.insert(record).await?)
    }

    async fn check(&self, token_id: &str) -> AuthResult<Option<Identity>> {
        Ok(self.find(token_id).await?)
    }

    async fn remove(&self, token_id: &str) -> AuthResult<()> {
        Ok(self.delete(token_id).await?)
    }

    async fn remove_all_for_user(&self, user_id: &str) -> AuthResult<u64> {
        let removed = self.delete_for_user(user_id).await?;
        info!(user_id = %user_id, removed, "Removed all sessions for user");
        Ok(removed)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
