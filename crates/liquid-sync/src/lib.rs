//! Replica synchronization for the Liquid object store.
//!
//! A replica exports a [`SyncBundle`] (objects, its change log, and a
//! timestamp); another replica imports it by merging each object with
//! [`merge`] and appending the change log. There is no negotiation, locking,
//! or leader: bundles may be exchanged at any time, in any direction.
//!
//! The merge is last-writer-wins on `updatedAt` at object granularity, with
//! a per-key union of properties and a wholesale overlay of each relationship
//! slot the peer sent. It is not conflict-free: concurrent relationship edits on two
//! replicas can lose one side.

pub mod error;
pub mod merge;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use merge::{merge, Merged, MergeOutcome};
pub use types::{ImportReport, RelationshipSlots, RemoteObject, SyncBundle};
