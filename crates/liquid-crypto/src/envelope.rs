use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::key::StoreKey;

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

const NONCE_LEN: usize = 24;

/// Encrypted wrapper around one serialized record.
///
/// On-disk form is JSON:
/// ```text
/// {"v":1,"nonce":"<48 hex>","ciphertext":"<hex>"}
/// ```
/// The ciphertext carries the Poly1305 tag. The record name is authenticated
/// as associated data but not stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub v: u8,
    pub nonce: String,
    pub ciphertext: String,
}

impl Envelope {
    /// Encrypt `plaintext` under `key`, binding `record_name` as associated data.
    pub fn seal(key: &StoreKey, record_name: &str, plaintext: &[u8]) -> CryptoResult<Self> {
        let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: record_name.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            v: ENVELOPE_VERSION,
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Decrypt and authenticate.
    pub fn open(&self, key: &StoreKey, record_name: &str) -> CryptoResult<Vec<u8>> {
        if self.v != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion(self.v));
        }
        let nonce_bytes =
            hex::decode(&self.nonce).map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::MalformedEnvelope(format!(
                "nonce is {} bytes, expected {NONCE_LEN}",
                nonce_bytes.len()
            )));
        }
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;

        let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
        cipher
            .decrypt(
                XNonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &ciphertext,
                    aad: record_name.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))
    }

    /// Parse the on-disk JSON form.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))
    }
}
