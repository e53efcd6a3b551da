use anchor_cli::commands::{log, open, submit, verify};
use anchor_cli::config::AnchorConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Anchor encrypted provenance records in a proof-of-work ledger.
#[derive(Parser, Debug)]
#[command(name = "anchor", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Ledger file (overrides `ledger_path` from the configuration).
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt, sign and anchor a provenance record
    Submit {
        /// Path to the record JSON file
        #[arg(long)]
        record: PathBuf,
        /// Secret key used for encryption and signing
        #[arg(long)]
        key: String,
        /// Leading zero hex characters required of the block hash
        #[arg(long)]
        difficulty: Option<u32>,
    },
    /// Display the ledger in human-readable format
    Log,
    /// Verify the integrity of the whole ledger
    Verify {
        /// Minimum difficulty every block must meet
        #[arg(long)]
        difficulty: Option<u32>,
    },
    /// Decrypt a submitted record and check it against its block
    Open {
        /// Encrypted envelope as returned by submit
        #[arg(long)]
        encrypted: String,
        /// Signature as returned by submit
        #[arg(long)]
        signature: String,
        /// Secret key used at submission
        #[arg(long)]
        key: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AnchorConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Submit {
            record,
            key,
            difficulty,
        } => {
            let config = config.with_overrides(cli.ledger, difficulty)?;
            submit::cmd_submit(&config, &record, &key)
        }
        Commands::Log => log::cmd_log(&config.with_overrides(cli.ledger, None)?),
        Commands::Verify { difficulty } => {
            verify::cmd_verify(&config.with_overrides(cli.ledger, difficulty)?)
        }
        Commands::Open {
            encrypted,
            signature,
            key,
        } => open::cmd_open(
            &config.with_overrides(cli.ledger, None)?,
            &encrypted,
            &signature,
            &key,
        ),
    }
}
