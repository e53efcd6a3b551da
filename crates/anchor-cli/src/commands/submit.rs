//! `anchor submit`: encrypt, sign and anchor a record file.

use crate::commands::file_ledger;
use crate::config::AnchorConfig;
use anchor_chain::LedgerAppender;
use anchor_crypto::SecretKey;
use anchor_types::ProvenanceRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Handle the anchor submit command. Prints the receipt JSON to stdout.
pub fn cmd_submit(config: &AnchorConfig, record_file: &Path, key: &str) -> Result<()> {
    let json = fs::read_to_string(record_file)
        .with_context(|| format!("failed to read record from {}", record_file.display()))?;
    let record: ProvenanceRecord =
        serde_json::from_str(&json).context("failed to parse provenance record JSON")?;
    let key = SecretKey::new(key).context("invalid --key")?;

    info!(
        ledger = %config.ledger_path.display(),
        difficulty = %config.difficulty,
        "submitting record"
    );
    let appender = LedgerAppender::new(file_ledger(&config.ledger_path), config.append_options());
    let receipt = appender
        .submit_record(&record, &key)
        .context("failed to anchor record")?;

    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
