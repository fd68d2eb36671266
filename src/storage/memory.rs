//! In-memory store for tests and local development.

use crate::error::TokenError;
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// `KeyValueStore` backed by a process-local map with lazy TTL expiry.
///
/// Cloning shares the underlying map, so a test can hand a clone to a
/// manager and still inspect the store afterwards.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, expiring stale ones first.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    /// Whether the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TokenError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, TokenError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, TokenError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, TokenError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);

        let matches: Vec<String> = match pattern.strip_suffix('*') {
            Some(prefix) => entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect(),
            None => entries.keys().filter(|k| *k == pattern).cloned().collect(),
        };
        Ok(matches)
    }

    async fn delete(&self, key: &str) -> Result<(), TokenError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store
            .set("k1", "v1", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k1").await.unwrap().as_deref(), Some("v1"));
        assert!(store.exists("k1").await.unwrap());

        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
        assert!(!store.exists("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let store = MemoryStore::new();
        store
            .set("k1", "v1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("k1", "v2", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k1").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryStore::new();
        store
            .set("gone", "v", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert!(!store.exists("gone").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_glob() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set("a:1", "v", ttl).await.unwrap();
        store.set("a:2", "v", ttl).await.unwrap();
        store.set("b:1", "v", ttl).await.unwrap();

        let mut keys = store.keys("a:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a:1", "a:2"]);

        assert_eq!(store.keys("b:1").await.unwrap(), vec!["b:1"]);
        assert!(store.keys("c:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(handle.exists("k").await.unwrap());
    }
}
