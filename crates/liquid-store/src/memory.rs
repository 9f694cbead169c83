use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// In-memory, map-based record store.
///
/// Intended for tests and embedding. Records are lost when the store is
/// dropped.
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut map = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(name).is_some())
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        let map = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.keys().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .finish()
    }
}
