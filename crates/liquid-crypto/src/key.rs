use std::fs;
use std::io::Write;
use std::path::Path;

use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// BLAKE3 key-derivation context for passphrase keys.
const PASSPHRASE_CONTEXT: &str = "liquid-store 2024-01 record key v1";

/// Symmetric key protecting every persisted record of one store.
///
/// Generated once per store instance unless supplied externally (raw hex,
/// a passphrase, or a key file).
#[derive(Clone, PartialEq, Eq)]
pub struct StoreKey([u8; 32]);

impl StoreKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw 32-byte key material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a key from a passphrase. The same passphrase always yields the
    /// same key.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(blake3::derive_key(PASSPHRASE_CONTEXT, passphrase.as_bytes()))
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short fingerprint for logs; never reveals key material.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::hash(&self.0);
        hex::encode(&digest.as_bytes()[..4])
    }

    /// Read a hex key file.
    pub fn load(path: &Path) -> CryptoResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_hex(&text)
    }

    /// Write this key as hex, creating parent directories. On unix the
    /// file is readable by its owner only, also when it already existed.
    pub fn save(&self, path: &Path) -> CryptoResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_owner_only(path)?;
        file.write_all(self.to_hex().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Load the key at `path`, or generate and save a new one if the file
    /// does not exist.
    pub fn load_or_generate(path: &Path) -> CryptoResult<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let key = Self::generate();
        key.save(path)?;
        Ok(key)
    }
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreKey(<redacted {}>)", self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        assert_ne!(StoreKey::generate(), StoreKey::generate());
    }

    #[test]
    fn passphrase_is_deterministic() {
        let a = StoreKey::from_passphrase("correct horse");
        let b = StoreKey::from_passphrase("correct horse");
        let c = StoreKey::from_passphrase("battery staple");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hex_roundtrip() {
        let key = StoreKey::generate();
        let parsed = StoreKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn hex_rejects_wrong_length() {
        let err = StoreKey::from_hex("abcd").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
        assert!(StoreKey::from_hex("zz").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let key = StoreKey::from_bytes([7; 32]);
        let debug = format!("{key:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(&key.to_hex()));
    }

    #[test]
    fn load_or_generate_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("store.key");
        let first = StoreKey::load_or_generate(&path).unwrap();
        assert!(path.exists());
        let second = StoreKey::load_or_generate(&path).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.key");
        fs::write(&path, "stale").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let key = StoreKey::generate();
        key.save(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(StoreKey::load(&path).unwrap(), key);
    }
}
