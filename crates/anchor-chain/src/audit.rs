//! Whole-ledger verification.

use crate::guard::{ChainIntegrityError, ChainIntegrityGuard};
use crate::store::StoredBlock;
use anchor_types::{BlockId, Difficulty, GENESIS_HASH};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("block {id}: {source}")]
    Integrity {
        id: BlockId,
        source: ChainIntegrityError,
    },

    #[error("block {id} reuses salt {salt}")]
    DuplicateSalt { id: BlockId, salt: String },

    #[error("block {id} reuses hash {hash}")]
    DuplicateHash { id: BlockId, hash: String },

    #[error("block at position {position} has id {id}")]
    OutOfOrder { position: usize, id: BlockId },

    #[error("block {id} timestamp {timestamp} is earlier than its predecessor's {previous}")]
    TimestampRegression {
        id: BlockId,
        timestamp: i64,
        previous: i64,
    },
}

/// Summary of a successful audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub blocks: usize,
    pub tail_hash: String,
    /// Fewest leading zero hex characters seen across all block hashes.
    pub weakest_work: Option<usize>,
}

/// Verify every ledger invariant over `blocks` (creation order).
///
/// Checks salt and hash uniqueness, the genesis link, each predecessor link,
/// hash recomputation, the difficulty floor and non-decreasing timestamps.
pub fn audit_chain(blocks: &[StoredBlock], difficulty: Difficulty) -> Result<AuditReport, AuditError> {
    let guard = ChainIntegrityGuard::new(difficulty);
    let mut salts = HashSet::new();
    let mut hashes = HashSet::new();
    let mut previous = GENESIS_HASH.to_string();
    let mut previous_timestamp: Option<i64> = None;
    let mut weakest_work: Option<usize> = None;

    for (position, stored) in blocks.iter().enumerate() {
        if stored.id != BlockId(position as u64) {
            return Err(AuditError::OutOfOrder {
                position,
                id: stored.id,
            });
        }

        if !salts.insert(stored.block.salt.as_str()) {
            return Err(AuditError::DuplicateSalt {
                id: stored.id,
                salt: stored.block.salt.clone(),
            });
        }
        if !hashes.insert(stored.block.block_hash.as_str()) {
            return Err(AuditError::DuplicateHash {
                id: stored.id,
                hash: stored.block.block_hash.clone(),
            });
        }

        guard
            .validate_link(&stored.block, &previous)
            .map_err(|source| AuditError::Integrity {
                id: stored.id,
                source,
            })?;

        if let Some(previous) = previous_timestamp {
            if stored.block.timestamp < previous {
                return Err(AuditError::TimestampRegression {
                    id: stored.id,
                    timestamp: stored.block.timestamp,
                    previous,
                });
            }
        }
        previous_timestamp = Some(stored.block.timestamp);

        let zeros = stored
            .block
            .block_hash
            .bytes()
            .take_while(|b| *b == b'0')
            .count();
        weakest_work = Some(weakest_work.map_or(zeros, |w| w.min(zeros)));
        previous.clone_from(&stored.block.block_hash);
    }

    Ok(AuditReport {
        blocks: blocks.len(),
        tail_hash: previous,
        weakest_work,
    })
}
