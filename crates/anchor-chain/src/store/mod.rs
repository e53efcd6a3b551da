//! Ledger persistence abstraction.
//!
//! Mining and integrity logic only see the [`Ledger`] trait: the tail, a
//! compare-and-swap append, and lookups. Two backends ship with the crate:
//! - [`MemoryLedger`] for tests and embedding;
//! - [`FileLedger`], a JSON file re-read on every operation.

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use anchor_types::{Block, BlockId, GENESIS_HASH};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// A block together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: BlockId,
    #[serde(flatten)]
    pub block: Block,
}

/// Uniqueness constraint rejected by the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("an item with the same salt ({salt}) already exists in the ledger")]
    DuplicateSalt { salt: String },

    #[error("a block with the same hash ({hash}) already exists in the ledger")]
    DuplicateHash { hash: String },
}

/// Store could not be read or written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AppendError {
    /// The tail moved since the caller read it; re-fetch and re-mine.
    #[error("stale tail: expected {expected}, current tail is {current}")]
    StaleTail { expected: String, current: String },

    #[error(transparent)]
    Conflict(#[from] ConstraintViolation),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Append-only block store.
///
/// Implementations must be safe for concurrent callers and must perform
/// the tail check and both uniqueness checks of
/// [`append_if_tail_matches`](Ledger::append_if_tail_matches) atomically
/// with the write.
pub trait Ledger: Send + Sync + Debug {
    /// Most recently created block, if any.
    fn tail(&self) -> Result<Option<StoredBlock>, StoreError>;

    /// Hash of the tail block, or the genesis sentinel for an empty ledger.
    fn tail_hash(&self) -> Result<String, StoreError> {
        Ok(self
            .tail()?
            .map_or_else(|| GENESIS_HASH.to_string(), |tail| tail.block.block_hash))
    }

    /// Append `block` only if the current tail hash is still `expected_tail`.
    fn append_if_tail_matches(&self, block: Block, expected_tail: &str)
        -> Result<BlockId, AppendError>;

    fn get_by_id(&self, id: BlockId) -> Result<Option<StoredBlock>, StoreError>;

    /// All blocks in creation order.
    fn blocks(&self) -> Result<Vec<StoredBlock>, StoreError>;

    fn find_by_salt(&self, salt: &str) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.blocks()?.into_iter().find(|stored| stored.block.salt == salt))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.blocks()?.len())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Compare-and-swap precondition shared by the backends.
///
/// `expected` in the error is the tail the block was built against: the
/// block's own link when that is what disagrees with the current tail.
fn check_tail(current: &str, block: &Block, expected_tail: &str) -> Result<(), AppendError> {
    if block.previous_block_hash != current {
        return Err(AppendError::StaleTail {
            expected: block.previous_block_hash.clone(),
            current: current.to_string(),
        });
    }
    if expected_tail != current {
        return Err(AppendError::StaleTail {
            expected: expected_tail.to_string(),
            current: current.to_string(),
        });
    }
    Ok(())
}
