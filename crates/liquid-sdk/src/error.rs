use liquid_types::{ObjectId, RelationshipId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiquidError {
    /// The operation named an object that does not exist.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// One endpoint of a relationship was persisted and the other was not,
    /// and the first could not be rolled back. `committed` carries the new
    /// link (in memory and on disk); `failed` is unchanged.
    #[error("relationship {relationship} partially applied: {committed} updated, {failed} not ({reason})")]
    PartialRelationship {
        relationship: RelationshipId,
        committed: ObjectId,
        failed: ObjectId,
        reason: String,
    },

    /// A property held NaN or an infinity, which the JSON records cannot
    /// represent.
    #[error("property {0:?} is not a finite number")]
    NonFiniteNumber(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] liquid_store::StoreError),

    #[error("sync error: {0}")]
    Sync(#[from] liquid_sync::SyncError),

    #[error("crypto error: {0}")]
    Crypto(#[from] liquid_crypto::CryptoError),

    #[error("change log error: {0}")]
    Ledger(#[from] liquid_ledger::LedgerError),
}

pub type LiquidResult<T> = Result<T, LiquidError>;
