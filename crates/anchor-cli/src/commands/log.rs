//! `anchor log`: human-readable ledger listing.

use crate::commands::file_ledger;
use crate::config::AnchorConfig;
use anchor_chain::Ledger;
use anyhow::{Context, Result};
use chrono::DateTime;
use colored::Colorize;

/// Handle the anchor log command.
pub fn cmd_log(config: &AnchorConfig) -> Result<()> {
    let path = &config.ledger_path;
    let blocks = file_ledger(path)
        .blocks()
        .with_context(|| format!("failed to load ledger from {}", path.display()))?;

    if blocks.is_empty() {
        println!("{}", "Ledger is empty".yellow());
        return Ok(());
    }

    println!("{}", "Provenance Ledger".bold().underline());
    println!("{}: {}", "File".bold(), path.display());
    println!("{}: {}", "Blocks".bold(), blocks.len());
    println!();

    for stored in &blocks {
        let block = &stored.block;
        println!("{} {}", "Block".bold().cyan(), stored.id.to_string().cyan());
        println!("  {}: {}", "Hash".bold(), block.block_hash.green());
        println!("  {}: {}", "Previous".bold(), block.previous_block_hash);
        match DateTime::from_timestamp_millis(block.timestamp) {
            Some(at) => println!("  {}: {}", "Timestamp".bold(), at.to_rfc3339()),
            None => println!("  {}: {}", "Timestamp".bold(), block.timestamp),
        }
        println!("  {}: {}", "Nonce".bold(), block.nonce);
        println!("  {}: {}", "Record Digest".bold(), block.record_digest);
        println!("  {}: {}", "Salt".bold(), block.salt);
        println!("  {}: {}", "Signature".bold(), signature_preview(&block.signature));
        println!();
    }

    Ok(())
}

/// First 24 characters of a signature, marked when truncated.
fn signature_preview(signature: &str) -> String {
    if signature.chars().count() > 24 {
        format!("{}...", signature.chars().take(24).collect::<String>())
    } else {
        signature.to_string()
    }
}
