//! Ledger block structures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a hex-encoded SHA3-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Predecessor link of the first block in a ledger.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Store-assigned identity of a persisted block (its position in creation order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed fields of a block, hashed together with the nonce during mining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFields {
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub record_digest: String,
    pub salt: String,
    pub signature: String,
    pub previous_block_hash: String,
}

/// A sealed ledger block.
///
/// Constructed once by mining and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: i64,
    pub record_digest: String,
    pub salt: String,
    pub signature: String,
    pub previous_block_hash: String,
    pub nonce: u64,
    pub block_hash: String,
}

impl Block {
    /// Seal candidate fields with the nonce and hash found by mining.
    pub fn new(fields: CandidateFields, nonce: u64, block_hash: String) -> Self {
        Self {
            timestamp: fields.timestamp,
            record_digest: fields.record_digest,
            salt: fields.salt,
            signature: fields.signature,
            previous_block_hash: fields.previous_block_hash,
            nonce,
            block_hash,
        }
    }

    /// The fields that, together with `nonce`, determine `block_hash`.
    pub fn candidate_fields(&self) -> CandidateFields {
        CandidateFields {
            timestamp: self.timestamp,
            record_digest: self.record_digest.clone(),
            salt: self.salt.clone(),
            signature: self.signature.clone(),
            previous_block_hash: self.previous_block_hash.clone(),
        }
    }

    pub fn is_genesis_linked(&self) -> bool {
        self.previous_block_hash == GENESIS_HASH
    }
}
