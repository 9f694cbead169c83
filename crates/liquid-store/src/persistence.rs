use std::sync::Arc;

use liquid_crypto::StoreKey;
use liquid_types::{LiquidObject, ObjectId};
use tracing::{debug, warn};

use crate::codec::ObjectCodec;
use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// A persisted record that could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeFailure {
    pub record: String,
    pub reason: String,
}

/// Result of scanning every persisted record at startup.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully decoded objects, in record-name order.
    pub objects: Vec<LiquidObject>,
    /// Records that were skipped.
    pub failures: Vec<DecodeFailure>,
}

/// Encrypted object persistence over any [`RecordStore`].
pub struct ObjectPersistence {
    records: Arc<dyn RecordStore>,
    codec: ObjectCodec,
}

impl ObjectPersistence {
    pub fn new(records: Arc<dyn RecordStore>, key: StoreKey) -> Self {
        Self {
            records,
            codec: ObjectCodec::new(key),
        }
    }

    pub fn key(&self) -> &StoreKey {
        self.codec.key()
    }

    /// Write the full current representation of `object`, replacing any
    /// earlier record for the same id.
    pub fn save(&self, object: &LiquidObject) -> StoreResult<()> {
        let bytes = self.codec.encode(object)?;
        self.records
            .write(&ObjectCodec::record_name(object), &bytes)?;
        debug!(id = %object.id, version = object.version(), "persisted object");
        Ok(())
    }

    /// Read and decode a single object.
    pub fn load(&self, id: &ObjectId) -> StoreResult<Option<LiquidObject>> {
        let name = id.to_string();
        match self.records.read(&name)? {
            Some(bytes) => self.codec.decode(&name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Scan and decode every record.
    ///
    /// Failing to list records is an error; failing to read or decode an
    /// individual record is logged and recorded in the report.
    pub fn load_all(&self) -> StoreResult<LoadReport> {
        let mut report = LoadReport::default();
        for name in self.records.names()? {
            let result = match self.records.read(&name) {
                Ok(Some(bytes)) => self.codec.decode(&name, &bytes),
                // Removed between listing and reading.
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            match result {
                Ok(object) => report.objects.push(object),
                Err(err) => {
                    let reason = match err {
                        StoreError::Decode { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(record = %name, %reason, "skipping unreadable record");
                    report.failures.push(DecodeFailure {
                        record: name,
                        reason,
                    });
                }
            }
        }
        debug!(
            loaded = report.objects.len(),
            skipped = report.failures.len(),
            "loaded persisted objects"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ObjectPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPersistence")
            .field("key", self.codec.key())
            .finish_non_exhaustive()
    }
}
