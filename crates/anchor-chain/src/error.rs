use crate::guard::ChainIntegrityError;
use crate::miner::MiningError;
use crate::store::{AppendError, ConstraintViolation, StoreError};
use anchor_crypto::CryptoError;
use anchor_types::{BlockId, ValidationError};
use thiserror::Error;

/// Failure of a ledger operation, with a human-readable message.
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),

    #[error("chain integrity violation: {0}")]
    ChainIntegrity(#[from] ChainIntegrityError),

    #[error("failed to save block: {0}")]
    Conflict(#[from] ConstraintViolation),

    /// The store accepted the write but could not return it on read-back.
    /// No compensating action is taken; the block may or may not exist.
    #[error("block {id} was written but is not visible on read-back")]
    Confirmation { id: BlockId },

    #[error("ledger unavailable: {0}")]
    Unavailable(#[from] StoreError),

    #[error("gave up after {attempts} attempts: the ledger tail kept advancing")]
    RetriesExhausted { attempts: u32 },

    #[error("mining aborted: {0}")]
    Mining(#[from] MiningError),

    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("no block in the ledger is anchored to salt {salt}")]
    NotAnchored { salt: String },

    #[error("block {id} does not match the envelope: {field} differs")]
    AnchorMismatch { id: BlockId, field: &'static str },
}

impl From<AppendError> for AnchorError {
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::StaleTail { expected, current } => {
                AnchorError::ChainIntegrity(ChainIntegrityError::PreviousHashMismatch {
                    expected: current,
                    found: expected,
                })
            }
            AppendError::Conflict(violation) => AnchorError::Conflict(violation),
            AppendError::Store(err) => AnchorError::Unavailable(err),
        }
    }
}
