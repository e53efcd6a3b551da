//! Envelope encryption and signatures for provenance records.
//!
//! Both primitives are keyed by the same caller-supplied [`SecretKey`]:
//! - [`encrypt`] / [`decrypt`] seal a plaintext under a fresh random salt,
//!   producing `"<salt>.<body>"` text;
//! - [`sign`] / [`verify`] bind that text to the key with an Ed25519
//!   signature whose keypair is derived from the key material.
//!
//! # Example
//!
//! ```
//! use anchor_crypto::{decrypt_str, encrypt, sign, verify, SecretKey};
//!
//! let key = SecretKey::new("k1").unwrap();
//! let envelope = encrypt(b"hello", &key).unwrap().to_string();
//! let signature = sign(&envelope, &key);
//!
//! assert!(verify(&envelope, &signature, &key));
//! assert_eq!(decrypt_str(&envelope, &key).unwrap(), "hello");
//! ```

mod envelope;
mod error;
mod key;
mod signature;

pub use envelope::{
    decrypt, decrypt_str, encrypt, extract_salt, EncryptedPayload, DELIMITER, NONCE_LEN, SALT_LEN,
};
pub use error::CryptoError;
pub use key::SecretKey;
pub use signature::{sign, verify, SIGNATURE_PREFIX};
