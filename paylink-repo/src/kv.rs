//! In-memory TTL key/value store.
//!
//! Backs idempotency records (24 h TTL) and webhook dedup markers (7 d TTL)
//! in single-process deployments. The `set_if_absent` claim is atomic: the
//! dashmap entry API holds the shard lock for the whole check-and-insert, so
//! two racing callers cannot both claim one key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use paylink_types::{KvStore, RepoError};

struct KvEntry {
    value: String,
    expires_at: Instant,
}

impl KvEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local [`KvStore`] implementation.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, KvEntry>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (expired ones are evicted lazily).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RepoError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Lazy eviction; the guard above must be dropped before removal.
        self.entries.remove_if(key, |_, v| v.is_expired());
        Ok(None)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, RepoError> {
        let fresh = KvEntry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(fresh);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), RepoError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_if_absent_claims_once() {
        let store = MemoryKvStore::new();
        let ttl = Duration::from_secs(60);

        assert!(store.set_if_absent("k1", "first", ttl).await.unwrap());
        assert!(!store.set_if_absent("k1", "second", ttl).await.unwrap());
        assert_eq!(store.get("k1").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let store = MemoryKvStore::new();

        store
            .set_if_absent("k1", "v", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("k1").await.unwrap(), None);
        assert!(
            store
                .set_if_absent("k1", "v2", Duration::from_secs(60))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryKvStore::new();
        store
            .set_if_absent("k1", "v", Duration::from_secs(60))
            .await
            .unwrap();
        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_claims_yield_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryKvStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .set_if_absent("race", &format!("claim-{}", i), Duration::from_secs(60))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
