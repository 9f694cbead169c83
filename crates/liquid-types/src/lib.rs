//! Foundation types for the Liquid object store.
//!
//! Every other Liquid crate depends on `liquid-types`. The crate holds the
//! schema-less object model and the primitive types it is built from; it does
//! no I/O and keeps no shared state.
//!
//! # Key Types
//!
//! - [`ObjectId`], [`RelationshipId`], [`ChangeId`], [`ReplicaId`] -- UUID v7 identifiers
//! - [`Timestamp`] -- UTC wall-clock instant that advances strictly per object
//! - [`Value`] -- tagged union for untyped property values
//! - [`LiquidObject`] -- the store's sole entity, with metadata, links, and history
//! - [`ChangeLogEntry`] -- one mutation event in the replica's change log

pub mod change;
pub mod error;
pub mod id;
pub mod object;
pub mod temporal;
pub mod value;

pub use change::{ChangeLogEntry, ChangeOperation, Provenance};
pub use error::TypeError;
pub use id::{ChangeId, ObjectId, RelationshipId, ReplicaId};
pub use object::{
    Direction, HistoryAction, HistoryEntry, LiquidObject, MutationMeta, ObjectMetadata,
    Relationship, RelationshipMetadata, Relationships, DEFAULT_AUTHOR,
};
pub use temporal::Timestamp;
pub use value::{Properties, Value};
