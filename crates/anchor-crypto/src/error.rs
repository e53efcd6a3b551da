use thiserror::Error;

/// Errors raised by the envelope and signature primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("secret key must not be empty")]
    EmptyKey,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("decryption failed: wrong key or tampered ciphertext")]
    DecryptionFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("signature does not match ciphertext and key")]
    SignatureMismatch,
}
