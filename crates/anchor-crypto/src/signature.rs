//! Ed25519 signatures bound to the caller's key material.

use crate::key::SecretKey;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use sha3::{Digest, Sha3_256};
use zeroize::Zeroizing;

/// Prefix of every signature string.
pub const SIGNATURE_PREFIX: &str = "ed25519:";

const SIGNING_DOMAIN: &[u8] = b"anchor/signature/ed25519/v1";

/// Derive the Ed25519 signing key for the given key material.
///
/// The seed is SHA3-256 over a domain tag and the length-prefixed material,
/// so signing keys never collide with the envelope's derived AEAD keys.
fn signing_key(key: &SecretKey) -> SigningKey {
    let mut hasher = Sha3_256::new();
    hasher.update(SIGNING_DOMAIN);
    hasher.update((key.as_bytes().len() as u64).to_le_bytes());
    hasher.update(key.as_bytes());
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(hasher.finalize().into());
    SigningKey::from_bytes(&seed)
}

/// Sign ciphertext text with the key, returning `"ed25519:<hex>"`.
pub fn sign(ciphertext: &str, key: &SecretKey) -> String {
    let signature = signing_key(key).sign(ciphertext.as_bytes());
    format!("{SIGNATURE_PREFIX}{}", hex::encode(signature.to_bytes()))
}

/// Verify a signature produced by [`sign`].
///
/// Returns `false` for malformed signature strings as well as mismatches.
pub fn verify(ciphertext: &str, signature: &str, key: &SecretKey) -> bool {
    let Some(sig_hex) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };

    let signature = Signature::from_bytes(&sig_array);
    signing_key(key)
        .verifying_key()
        .verify(ciphertext.as_bytes(), &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(material: &str) -> SecretKey {
        SecretKey::new(material).unwrap()
    }

    #[test]
    fn test_sign_and_verify_succeeds() {
        let k = key("k1");
        let sig = sign("salt.body", &k);
        assert!(sig.starts_with(SIGNATURE_PREFIX));
        assert_eq!(sig.len(), SIGNATURE_PREFIX.len() + 128);
        assert!(verify("salt.body", &sig, &k));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let k = key("k1");
        assert_eq!(sign("payload", &k), sign("payload", &k));
    }

    #[test]
    fn test_verify_with_wrong_key_fails() {
        let sig = sign("salt.body", &key("k1"));
        assert!(!verify("salt.body", &sig, &key("k2")));
    }

    #[test]
    fn test_verify_modified_ciphertext_fails() {
        let k = key("k1");
        let sig = sign("salt.body", &k);
        assert!(!verify("salt.bodx", &sig, &k));
        assert!(!verify("salt.body ", &sig, &k));
    }

    #[test]
    fn test_verify_signature_with_invalid_format() {
        let k = key("k1");
        assert!(!verify("data", "invalid-format", &k));
        assert!(!verify("data", "ed25519:zz", &k));
        assert!(!verify("data", "ed25519:abcd", &k));
    }

    #[test]
    fn test_verify_all_zero_signature_fails() {
        let k = key("k1");
        let zeros = format!("{SIGNATURE_PREFIX}{}", "00".repeat(64));
        assert!(!verify("data", &zeros, &k));
    }
}
