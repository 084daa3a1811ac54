//! Durable state store for workflow runs.
//!
//! One serialized [`StateRecord`](crate::workflow::state::StateRecord) is kept
//! per run under a namespaced key with a fixed retention window. The store is
//! the only resource shared between the normal execution path, regeneration,
//! and out-of-band progress pushes; every writer goes through a
//! read-modify-write sequence against it.

mod memory;
mod redis;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::workflow::state::StateRecord;

pub use memory::MemoryStateStore;
pub use redis::RedisStateStore;

/// Key prefix for workflow records.
const KEY_PREFIX: &str = "promo:workflow";

/// Builds the namespaced store key for a run.
pub(crate) fn record_key(run_id: &str) -> String {
    format!("{}:{}", KEY_PREFIX, run_id)
}

/// Abstract key/value store holding one record per run, with expiry.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persists the record under the run's key, refreshing its TTL.
    async fn put(&self, record: &StateRecord) -> Result<(), StoreError>;

    /// Loads the record for a run, or `None` if absent or expired.
    async fn get(&self, run_id: &str) -> Result<Option<StateRecord>, StoreError>;
}
