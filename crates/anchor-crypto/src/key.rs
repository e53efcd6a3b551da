use crate::error::CryptoError;
use std::fmt;
use zeroize::Zeroizing;

/// Caller-supplied key material.
///
/// How the key reaches the caller is outside this crate. The material is
/// wiped from memory on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(material: impl Into<String>) -> Result<Self, CryptoError> {
        let material = Zeroizing::new(material.into());
        if material.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        Ok(Self(material))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}
