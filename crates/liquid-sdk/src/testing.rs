//! Test doubles shared by the store's unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use liquid_store::{InMemoryRecordStore, RecordStore, StoreError, StoreResult};

use crate::config::StoreConfig;
use crate::store::LiquidStore;
use crate::StoreKey;

/// In-memory records whose writes can be made to fail per record name.
#[derive(Debug, Default)]
pub(crate) struct FlakyRecordStore {
    inner: InMemoryRecordStore,
    /// Remaining successful writes per record name; absent means unlimited.
    allowances: Mutex<HashMap<String, usize>>,
}

impl FlakyRecordStore {
    /// Allow `writes` more writes to `name`, then fail every later one.
    pub(crate) fn fail_after(&self, name: impl Into<String>, writes: usize) {
        self.allowances
            .lock()
            .unwrap()
            .insert(name.into(), writes);
    }

    pub(crate) fn heal(&self) {
        self.allowances.lock().unwrap().clear();
    }
}

impl RecordStore for FlakyRecordStore {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.read(name)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        if let Some(left) = self.allowances.lock().unwrap().get_mut(name) {
            if *left == 0 {
                return Err(StoreError::Io(io::Error::other(format!(
                    "injected write failure for {name}"
                ))));
            }
            *left -= 1;
        }
        self.inner.write(name, bytes)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        self.inner.delete(name)
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        self.inner.names()
    }
}

/// A store over flaky records, plus a handle to inject failures.
pub(crate) fn flaky_store() -> (LiquidStore, Arc<FlakyRecordStore>) {
    let records = Arc::new(FlakyRecordStore::default());
    let store = LiquidStore::with_records(
        records.clone(),
        StoreKey::generate(),
        StoreConfig::in_memory(),
    )
    .unwrap();
    (store, records)
}
