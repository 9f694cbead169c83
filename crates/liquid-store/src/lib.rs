//! Durable per-object record storage for the Liquid object store.
//!
//! Every object is persisted as one record named by its [`ObjectId`]. A
//! record holds the full object, serialized as JSON and sealed in an
//! encryption [`Envelope`](liquid_crypto::Envelope). Each write fully
//! replaces the prior record for that object; there is no append log.
//!
//! # Record Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`DirectoryRecordStore`] -- one file per record under a directory
//!
//! # Design Rules
//!
//! 1. A record is written whole or not at all (temp file + rename on disk).
//! 2. Record names are opaque to backends; only [`ObjectPersistence`] knows
//!    they are object identifiers.
//! 3. At load time a record that cannot be decoded is reported and skipped,
//!    never fatal.
//! 4. All I/O errors on the write path are propagated.
//!
//! [`ObjectId`]: liquid_types::ObjectId

pub mod codec;
pub mod directory;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod traits;

pub use codec::ObjectCodec;
pub use directory::DirectoryRecordStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use persistence::{DecodeFailure, LoadReport, ObjectPersistence};
pub use traits::RecordStore;
