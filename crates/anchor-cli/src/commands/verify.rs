//! `anchor verify`: audit the whole ledger.

use crate::commands::file_ledger;
use crate::config::AnchorConfig;
use anchor_chain::{audit_chain, Ledger};
use anyhow::{Context, Result};
use colored::Colorize;

/// Handle the anchor verify command.
pub fn cmd_verify(config: &AnchorConfig) -> Result<()> {
    let path = &config.ledger_path;
    let blocks = file_ledger(path)
        .blocks()
        .with_context(|| format!("failed to load ledger from {}", path.display()))?;

    let report = audit_chain(&blocks, config.difficulty).context("ledger verification failed")?;

    println!("{} Hash links valid", "✓".green().bold());
    println!(
        "{} Proof of work meets difficulty {}",
        "✓".green().bold(),
        config.difficulty
    );
    println!("{} Salts and hashes unique", "✓".green().bold());

    println!();
    println!("{}", "Summary:".bold().underline());
    println!("  {}: {}", "Blocks".bold(), report.blocks);
    println!("  {}: {}", "Tail".bold(), report.tail_hash);
    if let Some(weakest) = report.weakest_work {
        println!("  {}: {} leading zeros", "Weakest Block".bold(), weakest);
    }
    println!("  {}: {}", "Status".bold(), "VALID".green().bold());

    Ok(())
}
