//! Redis-backed store using a shared connection manager.

use crate::error::TokenError;
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// `KeyValueStore` backed by Redis.
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<RwLock<ConnectionManager>>,
}

impl RedisStore {
    /// Connect to Redis at the given URL.
    pub async fn new(redis_url: &str) -> Result<Self, TokenError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(RedisStore {
            conn: Arc::new(RwLock::new(conn)),
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TokenError> {
        let mut conn = self.conn.write().await;
        // SETEX rejects a zero expiry; the manager never passes one.
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, TokenError> {
        let mut conn = self.conn.write().await;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, TokenError> {
        let mut conn = self.conn.write().await;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, TokenError> {
        let mut conn = self.conn.write().await;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), TokenError> {
        let mut conn = self.conn.write().await;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
