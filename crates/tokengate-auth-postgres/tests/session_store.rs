//! Runs against a live database when `TOKENGATE_TEST_DATABASE_URL` is set.

use time::{Duration, OffsetDateTime};
use tokengate_auth::{Identity, RefreshTokenRecord, SessionStore};
use tokengate_auth_postgres::PostgresSessionStore;

async fn store() -> Option<PostgresSessionStore> {
    let url = std::env::var("TOKENGATE_TEST_DATABASE_URL").ok()?;
    let store = PostgresSessionStore::connect(&url, 2).await.unwrap();
    store.migrate().await.unwrap();
    Some(store)
}

fn record(user_id: &str, lifetime: Duration) -> RefreshTokenRecord {
    RefreshTokenRecord::issue(
        &Identity::new(user_id, format!("{user_id}@example.com")),
        OffsetDateTime::now_utc() + lifetime,
    )
}

#[tokio::test]
async fn test_session_lifecycle() {
    let Some(store) = store().await else {
        eprintln!("TOKENGATE_TEST_DATABASE_URL not set, skipping");
        return;
    };

    let user = format!("pg-{}", RefreshTokenRecord::generate_token());
    let live = record(&user, Duration::days(1));
    let other = record(&user, Duration::days(1));
    let expired = record(&user, Duration::seconds(-1));

    store.add(&live).await.unwrap();
    store.add(&other).await.unwrap();
    store.add(&expired).await.unwrap();
    assert!(store.add(&live).await.is_err());

    let identity = store.check(&live.token_id).await.unwrap().unwrap();
    assert_eq!(identity.user_id, user);
    assert!(store.check(&expired.token_id).await.unwrap().is_none());

    store.remove(&live.token_id).await.unwrap();
    store.remove(&live.token_id).await.unwrap();
    assert!(store.check(&live.token_id).await.unwrap().is_none());

    assert_eq!(store.remove_all_for_user(&user).await.unwrap(), 2);
    assert!(store.check(&other.token_id).await.unwrap().is_none());

    store.close().await;
}
