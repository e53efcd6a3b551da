//! Link and proof-of-work validation for candidate blocks.

use anchor_hash::{block_hash, hex_meets_difficulty};
use anchor_types::{Block, Difficulty, HASH_HEX_LEN};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainIntegrityError {
    #[error("previous hash mismatch: expected {expected}, found {found}")]
    PreviousHashMismatch { expected: String, found: String },

    #[error("block hash mismatch: stated {stated}, recomputed {computed}")]
    HashMismatch { stated: String, computed: String },

    #[error("block hash {hash} does not meet difficulty {difficulty}")]
    InsufficientWork { hash: String, difficulty: Difficulty },

    #[error("malformed hash {0:?}: expected {HASH_HEX_LEN} lowercase hex characters")]
    MalformedHash(String),
}

/// Checks that a block is correctly sealed and links onto a given tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainIntegrityGuard {
    difficulty: Difficulty,
}

impl ChainIntegrityGuard {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Validate `candidate` against the ledger's current tail hash.
    ///
    /// `current_tail_hash` is the genesis sentinel for an empty ledger.
    pub fn validate_link(
        &self,
        candidate: &Block,
        current_tail_hash: &str,
    ) -> Result<(), ChainIntegrityError> {
        if candidate.previous_block_hash != current_tail_hash {
            return Err(ChainIntegrityError::PreviousHashMismatch {
                expected: current_tail_hash.to_string(),
                found: candidate.previous_block_hash.clone(),
            });
        }
        self.validate_seal(candidate)
    }

    /// Validate the block on its own: hash format, recomputation, difficulty.
    pub fn validate_seal(&self, block: &Block) -> Result<(), ChainIntegrityError> {
        if !is_hash_hex(&block.block_hash) {
            return Err(ChainIntegrityError::MalformedHash(block.block_hash.clone()));
        }
        if !is_hash_hex(&block.previous_block_hash) {
            return Err(ChainIntegrityError::MalformedHash(
                block.previous_block_hash.clone(),
            ));
        }

        let computed = block_hash(&block.candidate_fields(), block.nonce);
        if computed != block.block_hash {
            return Err(ChainIntegrityError::HashMismatch {
                stated: block.block_hash.clone(),
                computed,
            });
        }

        if !hex_meets_difficulty(&block.block_hash, self.difficulty) {
            return Err(ChainIntegrityError::InsufficientWork {
                hash: block.block_hash.clone(),
                difficulty: self.difficulty,
            });
        }
        Ok(())
    }
}

/// True for exactly 64 lowercase hex characters.
pub fn is_hash_hex(value: &str) -> bool {
    value.len() == HASH_HEX_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
