//! Recover and cross-check an anchored record from its envelope.

use crate::error::AnchorError;
use crate::store::{Ledger, StoredBlock};
use anchor_crypto::{decrypt_str, extract_salt, verify, CryptoError, SecretKey};
use anchor_hash::record_digest;
use anchor_types::ProvenanceRecord;

/// A decrypted record and the block that anchors it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedRecord {
    pub record: ProvenanceRecord,
    pub block: StoredBlock,
}

/// Verify, decrypt and locate the block anchoring `encrypted`.
///
/// The signature is checked before decryption, and the anchoring block must
/// carry both the same signature and the digest of the decrypted record.
pub fn open_record(
    ledger: &dyn Ledger,
    encrypted: &str,
    signature: &str,
    key: &SecretKey,
) -> Result<OpenedRecord, AnchorError> {
    let salt = extract_salt(encrypted)?;
    if !verify(encrypted, signature, key) {
        return Err(CryptoError::SignatureMismatch.into());
    }

    let plaintext = decrypt_str(encrypted, key)?;
    let record: ProvenanceRecord = serde_json::from_str(&plaintext)?;

    let block = ledger
        .find_by_salt(&salt)?
        .ok_or_else(|| AnchorError::NotAnchored { salt: salt.clone() })?;
    if block.block.signature != signature {
        return Err(AnchorError::AnchorMismatch {
            id: block.id,
            field: "signature",
        });
    }
    if block.block.record_digest != record_digest(&record) {
        return Err(AnchorError::AnchorMismatch {
            id: block.id,
            field: "recordDigest",
        });
    }

    Ok(OpenedRecord { record, block })
}
