//! In-memory session store.
//!
//! Suitable for development and single-instance deployments. Records are
//! lost on restart, which logs every user out.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::storage::SessionStore;
use crate::types::{Identity, RefreshTokenRecord};
use crate::{AuthError, AuthResult};

/// Process-local [`SessionStore`] keyed by token hash.
///
/// Expired records stay in the map until they are removed or overwritten;
/// lookups treat them as absent.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored records, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn add(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let key = RefreshTokenRecord::hash_token(&record.token_id);
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(AuthError::storage("refresh token already exists"));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn check(&self, token_id: &str) -> AuthResult<Option<Identity>> {
        let key = RefreshTokenRecord::hash_token(token_id);
        let now = OffsetDateTime::now_utc();
        let records = self.records.read().await;
        Ok(records
            .get(&key)
            .filter(|record| !record.is_expired_at(now))
            .map(RefreshTokenRecord::identity))
    }

    async fn remove(&self, token_id: &str) -> AuthResult<()> {
        let key = RefreshTokenRecord::hash_token(token_id);
        self.records.write().await.remove(&key);
        Ok(())
    }

    async fn remove_all_for_user(&self, user_id: &str) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.user_id != user_id);
        Ok((before - records.len()) as u64)
    }

    async fn close(&self) {
        self.records.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn record(token_id: &str, user_id: &str, expires_in: Duration) -> RefreshTokenRecord {
        RefreshTokenRecord {
            token_id: token_id.to_string(),
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            expires_at: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_add_then_check() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "alice", Duration::hours(1))).await.unwrap();

        let identity = store.check("t1").await.unwrap().unwrap();
        assert_eq!(identity.user_id, "alice");
        assert_eq!(identity.email, "alice@example.com");

        assert!(store.check("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_keyed_by_hash() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "alice", Duration::hours(1))).await.unwrap();

        let records = store.records.read().await;
        assert!(!records.contains_key("t1"));
        assert!(records.contains_key(&RefreshTokenRecord::hash_token("t1")));
    }

    #[tokio::test]
    async fn test_expired_record_is_absent() {
        let store = MemorySessionStore::new();
        store.add(&record("old", "alice", -Duration::minutes(1))).await.unwrap();

        assert!(store.check("old").await.unwrap().is_none());
        // Still physically present: expiry is lazy.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "alice", Duration::hours(1))).await.unwrap();

        let err = store
            .add(&record("t1", "bob", Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Storage { .. }));
        assert_eq!(store.check("t1").await.unwrap().unwrap().user_id, "alice");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "alice", Duration::hours(1))).await.unwrap();

        store.remove("t1").await.unwrap();
        store.remove("t1").await.unwrap();
        store.remove("never-existed").await.unwrap();
        assert!(store.check("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_all_for_user_scope() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "A", Duration::hours(1))).await.unwrap();
        store.add(&record("t2", "A", Duration::hours(1))).await.unwrap();
        store.add(&record("t3", "B", Duration::hours(1))).await.unwrap();

        assert_eq!(store.remove_all_for_user("A").await.unwrap(), 2);

        assert!(store.check("t1").await.unwrap().is_none());
        assert!(store.check("t2").await.unwrap().is_none());
        assert!(store.check("t3").await.unwrap().is_some());

        assert_eq!(store.remove_all_for_user("A").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_releases_records() {
        let store = MemorySessionStore::new();
        store.add(&record("t1", "alice", Duration::hours(1))).await.unwrap();
        store.close().await;
        assert!(store.is_empty().await);
    }
}
