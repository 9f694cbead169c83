/// Errors from key handling and envelope operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("encryption failed")]
    EncryptionFailed,

    /// Wrong key, wrong record name, or tampered ciphertext.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
