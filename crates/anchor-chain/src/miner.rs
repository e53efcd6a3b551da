//! Proof-of-work nonce search.
//!
//! All searches return the smallest nonce whose block hash has at least
//! `difficulty` leading zero hex characters, so results are reproducible
//! regardless of how many workers took part.

use anchor_hash::{meets_difficulty, BlockHasher};
use anchor_types::{CandidateFields, Difficulty};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Nonces hashed between two cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub nonce: u64,
    pub block_hash: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("no nonce satisfies difficulty {difficulty}")]
    NonceSpaceExhausted { difficulty: Difficulty },
}

/// Cooperative cancellation for in-flight searches.
///
/// Clones share the same flag. A token may also carry a deadline, after
/// which it reports itself cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Signal every search holding this token to stop. Once set it stays set.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Sequential search from nonce 0.
pub fn mine(fields: &CandidateFields, difficulty: Difficulty) -> Result<MinedBlock, MiningError> {
    mine_cancellable(fields, difficulty, &CancelToken::new())
}

/// Sequential search that stops when `cancel` fires.
pub fn mine_cancellable(
    fields: &CandidateFields,
    difficulty: Difficulty,
    cancel: &CancelToken,
) -> Result<MinedBlock, MiningError> {
    let hasher = BlockHasher::new(fields);
    let mut nonce: u64 = 0;
    loop {
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(MiningError::Cancelled { attempts: nonce });
        }
        let digest = hasher.hash(nonce);
        if meets_difficulty(&digest, difficulty) {
            debug!(nonce, %difficulty, "block mined");
            return Ok(MinedBlock {
                nonce,
                block_hash: hex::encode(digest),
            });
        }
        nonce = nonce
            .checked_add(1)
            .ok_or(MiningError::NonceSpaceExhausted { difficulty })?;
    }
}

/// Search with `workers` threads over interleaved nonce ranges.
///
/// Worker `w` tries `w, w + workers, w + 2 * workers, ...`. Workers publish
/// hits into a shared minimum and stop once their next nonce exceeds it;
/// every nonce below the final minimum has then been tried by some worker,
/// which makes the result identical to [`mine`].
pub fn mine_parallel(
    fields: &CandidateFields,
    difficulty: Difficulty,
    workers: usize,
    cancel: &CancelToken,
) -> Result<MinedBlock, MiningError> {
    if workers <= 1 {
        return mine_cancellable(fields, difficulty, cancel);
    }

    let hasher = BlockHasher::new(fields);
    let search = StrideSearch {
        hasher: &hasher,
        difficulty,
        stride: workers as u64,
        cancel,
        best: AtomicU64::new(u64::MAX),
        found: AtomicBool::new(false),
        aborted: AtomicBool::new(false),
        attempts: AtomicU64::new(0),
    };

    rayon::scope(|scope| {
        for start in 0..workers as u64 {
            let search = &search;
            scope.spawn(move |_| search.run(start));
        }
    });

    let attempts = search.attempts.load(Ordering::SeqCst);
    if search.aborted.load(Ordering::SeqCst) {
        return Err(MiningError::Cancelled { attempts });
    }
    if !search.found.load(Ordering::SeqCst) {
        return Err(MiningError::NonceSpaceExhausted { difficulty });
    }

    let nonce = search.best.load(Ordering::SeqCst);
    debug!(nonce, attempts, workers, %difficulty, "block mined in parallel");
    Ok(MinedBlock {
        nonce,
        block_hash: hasher.hash_hex(nonce),
    })
}

struct StrideSearch<'a> {
    hasher: &'a BlockHasher,
    difficulty: Difficulty,
    stride: u64,
    cancel: &'a CancelToken,
    best: AtomicU64,
    found: AtomicBool,
    aborted: AtomicBool,
    attempts: AtomicU64,
}

impl StrideSearch<'_> {
    fn run(&self, start: u64) {
        let mut nonce = start;
        let mut tried: u64 = 0;
        loop {
            if self.found.load(Ordering::Acquire) && nonce > self.best.load(Ordering::Acquire) {
                break;
            }
            if tried % CANCEL_CHECK_INTERVAL == 0 && self.cancel.is_cancelled() {
                self.aborted.store(true, Ordering::SeqCst);
                break;
            }
            tried += 1;
            if meets_difficulty(&self.hasher.hash(nonce), self.difficulty) {
                self.best.fetch_min(nonce, Ordering::AcqRel);
                self.found.store(true, Ordering::Release);
                break;
            }
            match nonce.checked_add(self.stride) {
                Some(next) => nonce = next,
                None => break,
            }
        }
        self.attempts.fetch_add(tried, Ordering::Relaxed);
    }
}
