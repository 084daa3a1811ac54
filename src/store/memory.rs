//! In-memory state store for tests and local dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{record_key, StateStore};
use crate::error::StoreError;
use crate::workflow::state::StateRecord;

/// State store backed by a process-local map.
///
/// Records never expire; the retention window only matters for the Redis
/// store. Values are kept in serialized form so reads exercise the same
/// round-trip as the durable store.
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock not poisoned").len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a record, returning whether it existed. Test hook for
    /// simulating expiry.
    pub fn evict(&self, run_id: &str) -> bool {
        self.records
            .lock()
            .expect("store lock not poisoned")
            .remove(&record_key(run_id))
            .is_some()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, record: &StateRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.records
            .lock()
            .expect("store lock not poisoned")
            .insert(record_key(&record.run_id), value);
        Ok(())
    }

    async fn get(&self, run_id: &str) -> Result<Option<StateRecord>, StoreError> {
        let value = self
            .records
            .lock()
            .expect("store lock not poisoned")
            .get(&record_key(run_id))
            .cloned();
        match value {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}
