//! Record submission: seal, mine, append with compare-and-swap, confirm.

use crate::error::AnchorError;
use crate::guard::{ChainIntegrityError, ChainIntegrityGuard};
use crate::miner::{mine_parallel, CancelToken};
use crate::store::{AppendError, Ledger, StoredBlock};
use anchor_crypto::{encrypt, extract_salt, sign, SecretKey};
use anchor_hash::record_digest;
use anchor_types::{Block, BlockId, CandidateFields, Difficulty, ProvenanceRecord, GENESIS_HASH};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Tunables for [`LedgerAppender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOptions {
    pub difficulty: Difficulty,
    /// Mine-and-append rounds before giving up on a moving tail.
    pub max_attempts: u32,
    /// Threads used per search; 1 mines on the calling thread.
    pub mining_workers: usize,
    /// Upper bound on a single search.
    pub mining_timeout: Option<Duration>,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            max_attempts: 5,
            mining_workers: 1,
            mining_timeout: None,
        }
    }
}

impl AppendOptions {
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub encrypted: String,
    pub signature: String,
    pub key: String,
    pub block_id: BlockId,
    pub block_hash: String,
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Drives the read-tail / mine / guard / append / confirm sequence.
///
/// There is no lock across the sequence: a concurrent writer can advance
/// the tail while this one mines, in which case the append is rejected and
/// the block is re-mined against the new tail.
pub struct LedgerAppender {
    ledger: Arc<dyn Ledger>,
    options: AppendOptions,
    clock: Clock,
}

impl fmt::Debug for LedgerAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerAppender")
            .field("ledger", &self.ledger)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LedgerAppender {
    pub fn new(ledger: Arc<dyn Ledger>, options: AppendOptions) -> Self {
        Self {
            ledger,
            options,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replace the millisecond wall clock used for block timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn options(&self) -> &AppendOptions {
        &self.options
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Encrypt, sign and anchor a record.
    pub fn submit_record(
        &self,
        record: &ProvenanceRecord,
        key: &SecretKey,
    ) -> Result<SubmitReceipt, AnchorError> {
        record.validate()?;

        let plaintext = serde_json::to_string(record)?;
        let encrypted = encrypt(plaintext.as_bytes(), key)?.to_string();
        let signature = sign(&encrypted, key);
        let salt = extract_salt(&encrypted)?;
        let digest = record_digest(record);

        info!(sku = %record.sku, batch = %record.batch, %salt, "anchoring provenance record");
        let stored = self.append(&digest, &salt, &signature)?;

        Ok(SubmitReceipt {
            encrypted,
            signature,
            key: key.as_str().to_string(),
            block_id: stored.id,
            block_hash: stored.block.block_hash,
        })
    }

    /// Mine a block for the given sealed fields and append it to the tail.
    pub fn append(
        &self,
        record_digest: &str,
        salt: &str,
        signature: &str,
    ) -> Result<StoredBlock, AnchorError> {
        let difficulty = self.options.difficulty;
        let guard = ChainIntegrityGuard::new(difficulty);
        let attempts = self.options.max_attempts.max(1);

        for attempt in 1..=attempts {
            // Timestamps never run backwards along the chain, even if the clock does.
            let (tail, floor) = match self.ledger.tail()? {
                Some(tail) => (tail.block.block_hash, tail.block.timestamp),
                None => (GENESIS_HASH.to_string(), i64::MIN),
            };
            let fields = CandidateFields {
                timestamp: (self.clock)().max(floor),
                record_digest: record_digest.to_string(),
                salt: salt.to_string(),
                signature: signature.to_string(),
                previous_block_hash: tail,
            };

            let cancel = match self.options.mining_timeout {
                Some(timeout) => CancelToken::with_timeout(timeout),
                None => CancelToken::new(),
            };
            let mined = mine_parallel(&fields, difficulty, self.options.mining_workers, &cancel)?;
            let block = Block::new(fields, mined.nonce, mined.block_hash);

            let current = self.ledger.tail_hash()?;
            match guard.validate_link(&block, &current) {
                Ok(()) => {}
                Err(ChainIntegrityError::PreviousHashMismatch { .. }) => {
                    warn!(attempt, "ledger tail advanced while mining; re-mining");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            match self.ledger.append_if_tail_matches(block.clone(), &current) {
                Ok(id) => {
                    let stored = self.confirm(id, &block)?;
                    info!(%id, hash = %stored.block.block_hash, nonce = stored.block.nonce, attempt, "block anchored");
                    return Ok(stored);
                }
                Err(AppendError::StaleTail { .. }) => {
                    warn!(attempt, "append lost the race for the tail; re-mining");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AnchorError::RetriesExhausted { attempts })
    }

    fn confirm(&self, id: BlockId, block: &Block) -> Result<StoredBlock, AnchorError> {
        match self.ledger.get_by_id(id)? {
            Some(stored) if stored.block == *block => Ok(stored),
            Some(_) => {
                error!(%id, "read-back returned a different block");
                Err(AnchorError::Confirmation { id })
            }
            None => {
                error!(%id, "block not found immediately after append");
                Err(AnchorError::Confirmation { id })
            }
        }
    }
}

/// One-shot submission against `ledger`.
pub fn submit_record(
    ledger: Arc<dyn Ledger>,
    record: &ProvenanceRecord,
    key: &SecretKey,
    options: AppendOptions,
) -> Result<SubmitReceipt, AnchorError> {
    LedgerAppender::new(ledger, options).submit_record(record, key)
}
