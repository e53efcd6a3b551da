//! Proof-of-work ledger for encrypted provenance records.
//!
//! A submitted record is encrypted and signed, its digest is sealed into a
//! block that links to the current ledger tail, and a nonce is mined until
//! the block hash meets the configured difficulty. Appends are
//! compare-and-swap on the tail: when another writer wins the race the block
//! is re-mined against the new tail.
//!
//! # Example
//!
//! ```
//! use anchor_chain::{audit_chain, AppendOptions, Ledger, LedgerAppender, MemoryLedger};
//! use anchor_crypto::SecretKey;
//! use anchor_types::{Difficulty, ProvenanceRecord};
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let options = AppendOptions::with_difficulty(Difficulty::new(2).unwrap());
//! let appender = LedgerAppender::new(ledger.clone(), options);
//!
//! let record = ProvenanceRecord {
//!     product_name: "Widget".to_string(),
//!     sku: "X1".to_string(),
//!     batch: "B-7".to_string(),
//!     manufacture_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     quantity: 10,
//!     destination_shop: "Shop 1".to_string(),
//! };
//! let receipt = appender.submit_record(&record, &SecretKey::new("k1").unwrap()).unwrap();
//! assert!(receipt.block_hash.starts_with("00"));
//!
//! let report = audit_chain(&ledger.blocks().unwrap(), Difficulty::new(2).unwrap()).unwrap();
//! assert_eq!(report.blocks, 1);
//! ```

mod appender;
mod audit;
mod error;
mod guard;
mod miner;
mod open;
pub mod store;

pub use appender::{submit_record, AppendOptions, LedgerAppender, SubmitReceipt};
pub use audit::{audit_chain, AuditError, AuditReport};
pub use error::AnchorError;
pub use guard::{is_hash_hex, ChainIntegrityError, ChainIntegrityGuard};
pub use miner::{mine, mine_cancellable, mine_parallel, CancelToken, MinedBlock, MiningError};
pub use open::{open_record, OpenedRecord};
pub use store::{
    AppendError, ConstraintViolation, FileLedger, Ledger, MemoryLedger, StoreError, StoredBlock,
};
