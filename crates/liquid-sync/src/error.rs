use liquid_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A bundle could not be parsed.
    #[error("cannot decode sync bundle: {0}")]
    Decode(String),

    #[error("cannot encode sync bundle: {0}")]
    Encode(String),

    /// Merge was asked to reconcile two different objects.
    #[error("merge id mismatch: local {local}, remote {remote}")]
    IdMismatch { local: ObjectId, remote: ObjectId },
}

pub type SyncResult<T> = Result<T, SyncError>;
