//! Revoked session registry

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Session ids (`jti`) signed out before their token expired. Entries are
/// dropped once the token would have expired anyway.
#[derive(Debug, Default)]
pub struct SessionStore {
    revoked: DashMap<String, DateTime<Utc>>,
}

pub type SharedSessionStore = Arc<SessionStore>;

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSessionStore {
        Arc::new(Self::new())
    }

    pub fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        self.revoked.insert(jti.to_string(), expires_at);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// Forget revocations of tokens that have expired. Returns how many.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut purged = 0usize;
        self.revoked.retain(|_, exp| {
            let live = *exp > now;
            if !live {
                purged += 1;
            }
            live
        });
        purged
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn revoked_until_expiry() {
        let store = SessionStore::new();
        store.revoke("live", Utc::now() + Duration::hours(1));
        store.revoke("stale", Utc::now() - Duration::hours(1));
        assert!(store.is_revoked("live"));
        assert!(!store.is_revoked("other"));

        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_revoked("live"));
        assert!(!store.is_revoked("stale"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn purge_counts_only_what_it_removed_under_concurrent_revokes() {
        let store = SessionStore::shared();
        for i in 0..50 {
            store.revoke(&format!("old-{i}"), Utc::now() - Duration::hours(1));
        }

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    store.revoke(&format!("new-{i}"), Utc::now() + Duration::hours(1));
                    tokio::task::yield_now().await;
                }
            })
        };
        let purger = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut total = 0;
                for _ in 0..50 {
                    total += store.purge_expired();
                    tokio::task::yield_now().await;
                }
                total
            })
        };

        writer.await.unwrap();
        assert_eq!(purger.await.unwrap(), 50);
        assert_eq!(store.len(), 500);
    }
}
