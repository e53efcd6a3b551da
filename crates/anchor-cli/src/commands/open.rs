//! `anchor open`: decrypt an envelope and locate its anchoring block.

use crate::commands::file_ledger;
use crate::config::AnchorConfig;
use anchor_chain::open_record;
use anchor_crypto::SecretKey;
use anyhow::{Context, Result};
use colored::Colorize;

/// Handle the anchor open command. Prints the decrypted record JSON to stdout.
pub fn cmd_open(config: &AnchorConfig, encrypted: &str, signature: &str, key: &str) -> Result<()> {
    let key = SecretKey::new(key).context("invalid --key")?;
    let ledger = file_ledger(&config.ledger_path);
    let opened = open_record(&*ledger, encrypted, signature, &key)
        .context("failed to open record")?;

    eprintln!(
        "{} Anchored in block {} ({})",
        "✓".green().bold(),
        opened.block.id,
        opened.block.block.block_hash
    );
    println!("{}", serde_json::to_string_pretty(&opened.record)?);
    Ok(())
}
