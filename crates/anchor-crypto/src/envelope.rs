//! Salted authenticated encryption.
//!
//! Wire form is `"<salt>.<body>"`: the salt is [`SALT_LEN`] random bytes as
//! lowercase hex, the body is hex of `nonce || ciphertext || tag`. The AEAD
//! key is derived per salt with HKDF-SHA256, and the salt text is bound as
//! associated data, so neither half can be swapped without detection.

use crate::error::CryptoError;
use crate::key::SecretKey;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Random salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Separator between the salt and the body.
pub const DELIMITER: char = '.';

const TAG_LEN: usize = 16;
/// Nonce plus tag, the body of an empty plaintext.
const MIN_BODY_HEX_LEN: usize = (NONCE_LEN + TAG_LEN) * 2;
const KDF_INFO: &[u8] = b"anchor/envelope/aes-256-gcm/v1";

/// Parsed `"<salt>.<body>"` ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    salt: String,
    body: String,
}

impl EncryptedPayload {
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        let (salt, body) = text.split_once(DELIMITER).ok_or_else(|| {
            CryptoError::MalformedCiphertext(format!("missing '{DELIMITER}' delimiter"))
        })?;
        if salt.is_empty() {
            return Err(CryptoError::MalformedCiphertext("empty salt".to_string()));
        }
        if salt.len() != SALT_LEN * 2 || !salt.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::MalformedCiphertext(format!(
                "salt must be {} hex characters",
                SALT_LEN * 2
            )));
        }
        if body.is_empty() {
            return Err(CryptoError::MalformedCiphertext("empty body".to_string()));
        }
        if body.len() % 2 != 0 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::MalformedCiphertext(
                "body is not valid hex".to_string(),
            ));
        }
        if body.len() < MIN_BODY_HEX_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "body is {} hex characters, need at least {MIN_BODY_HEX_LEN}",
                body.len()
            )));
        }
        Ok(Self {
            salt: salt.to_string(),
            body: body.to_string(),
        })
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.salt, self.body)
    }
}

impl FromStr for EncryptedPayload {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Salt segment of an envelope's text form.
pub fn extract_salt(text: &str) -> Result<String, CryptoError> {
    EncryptedPayload::parse(text).map(|payload| payload.salt)
}

/// Encrypt `plaintext` under `key` with a freshly generated salt and nonce.
pub fn encrypt(plaintext: &[u8], key: &SecretKey) -> Result<EncryptedPayload, CryptoError> {
    let mut rng = rand::rng();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let salt_hex = hex::encode(salt);
    let cipher = derive_cipher(key, &salt)?;
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: salt_hex.as_bytes(),
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut body = Vec::with_capacity(NONCE_LEN + sealed.len());
    body.extend_from_slice(&nonce);
    body.extend_from_slice(&sealed);

    Ok(EncryptedPayload {
        salt: salt_hex,
        body: hex::encode(body),
    })
}

/// Decrypt a parsed envelope. Fails with `DecryptionFailed` on a wrong key.
pub fn decrypt(payload: &EncryptedPayload, key: &SecretKey) -> Result<Vec<u8>, CryptoError> {
    let salt = hex::decode(&payload.salt)
        .map_err(|_| CryptoError::MalformedCiphertext("salt is not valid hex".to_string()))?;
    let body = hex::decode(&payload.body)
        .map_err(|_| CryptoError::MalformedCiphertext("body is not valid hex".to_string()))?;
    if body.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::MalformedCiphertext(format!(
            "body is {} bytes, need at least {}",
            body.len(),
            NONCE_LEN + TAG_LEN
        )));
    }

    let (nonce, sealed) = body.split_at(NONCE_LEN);
    let cipher = derive_cipher(key, &salt)?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: sealed,
                aad: payload.salt.as_bytes(),
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Parse, decrypt and decode an envelope holding UTF-8 text.
pub fn decrypt_str(text: &str, key: &SecretKey) -> Result<String, CryptoError> {
    let payload = EncryptedPayload::parse(text)?;
    let plaintext = decrypt(&payload, key)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
}

fn derive_cipher(key: &SecretKey, salt: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), key.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hkdf.expand(KDF_INFO, &mut okm[..])
        .map_err(|_| CryptoError::KeyDerivation)?;
    Aes256Gcm::new_from_slice(&okm[..]).map_err(|_| CryptoError::KeyDerivation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(material: &str) -> SecretKey {
        SecretKey::new(material).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let k = key("k1");
        let payload = encrypt(b"{\"sku\":\"X1\"}", &k).unwrap();
        assert_eq!(decrypt(&payload, &k).unwrap(), b"{\"sku\":\"X1\"}");
    }

    #[test]
    fn test_text_form_parses_back() {
        let k = key("k1");
        let payload = encrypt(b"data", &k).unwrap();
        let text = payload.to_string();
        let parsed: EncryptedPayload = text.parse().unwrap();
        assert_eq!(parsed, payload);
        assert_eq!(extract_salt(&text).unwrap(), payload.salt());
        assert_eq!(payload.salt().len(), SALT_LEN * 2);
    }

    #[test]
    fn test_salt_regenerated_each_call() {
        let k = key("k1");
        let a = encrypt(b"same", &k).unwrap();
        let b = encrypt(b"same", &k).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.body(), b.body());
    }

    #[test]
    fn test_wrong_key_fails() {
        let payload = encrypt(b"secret", &key("k1")).unwrap();
        assert_eq!(
            decrypt(&payload, &key("k2")).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_tampered_body_fails() {
        let k = key("k1");
        let payload = encrypt(b"secret", &k).unwrap();
        let mut body = payload.body().to_string();
        let last = body.pop().unwrap();
        body.push(if last == '0' { '1' } else { '0' });
        let tampered = EncryptedPayload::parse(&format!("{}.{}", payload.salt(), body)).unwrap();
        assert_eq!(
            decrypt(&tampered, &k).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_swapped_salt_fails() {
        let k = key("k1");
        let a = encrypt(b"secret", &k).unwrap();
        let b = encrypt(b"secret", &k).unwrap();
        let spliced = EncryptedPayload::parse(&format!("{}.{}", b.salt(), a.body())).unwrap();
        assert_eq!(
            decrypt(&spliced, &k).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_missing_delimiter_is_malformed() {
        assert!(matches!(
            extract_salt("abcdef"),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_bad_salt_is_malformed() {
        assert!(matches!(
            EncryptedPayload::parse(".abcd"),
            Err(CryptoError::MalformedCiphertext(_))
        ));
        assert!(matches!(
            EncryptedPayload::parse("zz.abcd"),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_bad_body_is_malformed_before_decryption() {
        let salt = "ab".repeat(SALT_LEN);
        let short = "0".repeat(MIN_BODY_HEX_LEN - 2);
        for body in ["zz", "abc", short.as_str()] {
            let text = format!("{salt}.{body}");
            assert!(
                matches!(extract_salt(&text), Err(CryptoError::MalformedCiphertext(_))),
                "accepted body {body:?}"
            );
        }
        let minimal = format!("{salt}.{}", "0".repeat(MIN_BODY_HEX_LEN));
        assert_eq!(extract_salt(&minimal).unwrap(), salt);
    }

    #[test]
    fn test_short_body_is_malformed() {
        let text = format!("{}.{}", "ab".repeat(SALT_LEN), "00".repeat(NONCE_LEN));
        assert!(matches!(
            decrypt_str(&text, &key("k1")),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_empty_plaintext_round_trips() {
        let k = key("k1");
        let payload = encrypt(b"", &k).unwrap();
        assert!(decrypt(&payload, &k).unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip(plaintext in ".{0,200}", material in "[a-zA-Z0-9]{1,32}") {
            let k = key(&material);
            let text = encrypt(plaintext.as_bytes(), &k).unwrap().to_string();
            prop_assert_eq!(decrypt_str(&text, &k).unwrap(), plaintext);
        }

        #[test]
        fn prop_other_key_never_decrypts(plaintext in ".{0,64}", a in "[a-z]{1,16}", b in "[a-z]{1,16}") {
            prop_assume!(a != b);
            let text = encrypt(plaintext.as_bytes(), &key(&a)).unwrap().to_string();
            prop_assert_eq!(decrypt_str(&text, &key(&b)), Err(CryptoError::DecryptionFailed));
        }
    }
}
