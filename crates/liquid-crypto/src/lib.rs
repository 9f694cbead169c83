//! Cryptographic primitives for the Liquid object store.
//!
//! Every persisted object record is sealed in an [`Envelope`]: XChaCha20-Poly1305
//! under a 32-byte [`StoreKey`], with the record name bound in as associated
//! data so a record cannot be replayed under another object's name.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod envelope;
pub mod error;
pub mod key;

pub use envelope::{Envelope, ENVELOPE_VERSION};
pub use error::{CryptoError, CryptoResult};
pub use key::StoreKey;
