use liquid_crypto::CryptoError;

/// Errors from record storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A persisted record could not be decrypted or parsed.
    #[error("cannot decode record {record}: {reason}")]
    Decode { record: String, reason: String },

    /// Serialization failure on the write path.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The record name is not usable by this backend.
    #[error("invalid record name: {0:?}")]
    InvalidRecordName(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
