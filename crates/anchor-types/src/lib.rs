//! Shared data model for the provenance ledger.
//!
//! Records enter as [`ProvenanceRecord`], are sealed into [`Block`]s, and the
//! ledger links blocks through their hashes starting from [`GENESIS_HASH`].

mod block;
mod record;

pub use block::{Block, BlockId, CandidateFields, GENESIS_HASH, HASH_HEX_LEN};
pub use record::{Difficulty, ProvenanceRecord, ValidationError, MAX_FIELD_LEN};
