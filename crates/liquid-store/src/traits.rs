use crate::error::StoreResult;

/// Named, whole-record byte storage.
///
/// All implementations must satisfy these invariants:
/// - `write` fully replaces any prior record with the same name.
/// - A reader never observes a partially written record.
/// - `names` lists every record currently stored, in a stable order.
/// - All I/O errors are propagated, never silently ignored.
pub trait RecordStore: Send + Sync {
    /// Read a record by name. Returns `Ok(None)` if it does not exist.
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or overwrite a record.
    fn write(&self, name: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Delete a record. Returns `true` if it existed.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Names of all stored records, sorted.
    fn names(&self) -> StoreResult<Vec<String>>;

    /// Check whether a record exists.
    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.read(name)?.is_some())
    }
}
