//! Embedded Liquid object store.
//!
//! [`LiquidStore`] is the unified entry point for applications: schema-less,
//! versioned objects with audit history, a bidirectional relationship graph,
//! predicate queries, encrypted per-object persistence, and last-writer-wins
//! synchronization between replicas.
//!
//! A store is an explicitly constructed value. Share it between callers by
//! reference or `Arc`; every public operation takes `&self` and runs to
//! completion under the store's internal lock, so compound operations such as
//! [`LiquidStore::add_relationship`] are atomic with respect to each other.

pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod stats;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{KeySource, StoreConfig};
pub use error::{LiquidError, LiquidResult};
pub use graph::RelatedObject;
pub use query::Filter;
pub use stats::StoreStats;
pub use store::LiquidStore;

// Re-export key types
pub use liquid_crypto::StoreKey;
pub use liquid_ledger::ChangeLogLimits;
pub use liquid_store::{DecodeFailure, DirectoryRecordStore, InMemoryRecordStore, RecordStore};
pub use liquid_sync::{ImportReport, MergeOutcome, RelationshipSlots, RemoteObject, SyncBundle};
pub use liquid_types::{
    ChangeLogEntry, ChangeOperation, Direction, HistoryAction, HistoryEntry, LiquidObject,
    MutationMeta, ObjectId, Properties, Relationship, RelationshipId, ReplicaId, Timestamp, Value,
};
