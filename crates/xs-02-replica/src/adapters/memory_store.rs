//! In-memory anti-replay store for tests and single-process demos.

use crate::domain::StoreError;
use crate::ports::AntiReplayStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// `HashMap`-backed store. `may_exist` is exact.
#[derive(Default)]
pub struct InMemoryAntiReplayStore {
    records: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryAntiReplayStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl AntiReplayStore for InMemoryAntiReplayStore {
    fn may_exist(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.records.read().contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.records.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
