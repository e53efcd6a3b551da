//! Command handlers for the `anchor` binary.

pub mod log;
pub mod open;
pub mod submit;
pub mod verify;

use anchor_chain::FileLedger;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn file_ledger(path: &Path) -> Arc<FileLedger> {
    Arc::new(FileLedger::open(path))
}
