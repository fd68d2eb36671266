//! TTL-bearing key-value storage behind a trait, with Redis and in-memory
//! implementations.

pub mod keys;
pub mod memory;
pub mod redis;

use crate::error::TokenError;
use async_trait::async_trait;
use std::time::Duration;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Expiring key-value store consumed by the token lifecycle manager.
///
/// The store provides per-key atomicity for `set`/`get`/`exists`; no
/// cross-key transactions are assumed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Upsert a value with an expiry. Overwriting a key resets its TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TokenError>;

    /// Fetch a value, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, TokenError>;

    /// Whether a live (non-expired) key exists.
    async fn exists(&self, key: &str) -> Result<bool, TokenError>;

    /// Enumerate keys matching a trailing-`*` prefix glob.
    ///
    /// O(n) over the keyspace; used only by bulk revocation scans.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, TokenError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), TokenError>;
}
