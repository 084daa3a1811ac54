//! Redis-backed state store.
//!
//! Records are stored as JSON strings under `promo:workflow:<run_id>` with
//! `SET ... EX`, so every write refreshes the retention window. The
//! `ConnectionManager` handles reconnection automatically and is cheap to
//! clone per operation.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use async_trait::async_trait;

use super::{record_key, StateStore};
use crate::error::StoreError;
use crate::workflow::state::StateRecord;

/// State store backed by Redis.
pub struct RedisStateStore {
    redis: ConnectionManager,
    /// Retention window applied on every write, in seconds.
    ttl_secs: u64,
}

impl RedisStateStore {
    /// Connects to Redis and creates a new store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `ttl_secs` - Retention window for records, in seconds
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self { redis, ttl_secs })
    }

    /// Creates a store from an existing ConnectionManager.
    ///
    /// Useful when sharing a connection pool across multiple components.
    pub fn from_connection(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    /// The configured retention window in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn put(&self, record: &StateRecord) -> Result<(), StoreError> {
        let key = record_key(&record.run_id);
        let value = serde_json::to_string(record)?;
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, value, self.ttl_secs).await?;
        Ok(())
    }

    async fn get(&self, run_id: &str) -> Result<Option<StateRecord>, StoreError> {
        let key = record_key(run_id);
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(&key).await?;
        match value {
            Some(data) => {
                let record: StateRecord = serde_json::from_str(&data)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}
