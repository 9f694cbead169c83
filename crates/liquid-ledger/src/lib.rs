//! Bounded change log for the Liquid object store.
//!
//! This crate provides:
//! - [`ChangeLog`], the replica-local ledger of create/update/delete events
//! - [`ChangeLogLimits`], the trim policy applied after local appends
//! - Provenance tracking so entries re-imported from peers are recognized
//!   and skipped instead of duplicated

pub mod error;
pub mod log;

pub use error::LedgerError;
pub use log::{AbsorbReport, ChangeLog, ChangeLogLimits};
