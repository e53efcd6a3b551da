//! TOML configuration for the `anchor` binary.

use anchor_chain::AppendOptions;
use anchor_types::Difficulty;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File-backed settings. Every field is optional in the file.
///
/// ```toml
/// difficulty = 4
/// max_attempts = 10
/// mining_workers = 4
/// mining_timeout_secs = 30
/// ledger_path = "data/ledger.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    pub difficulty: Difficulty,
    pub max_attempts: u32,
    pub mining_workers: usize,
    pub mining_timeout_secs: Option<u64>,
    pub ledger_path: PathBuf,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            max_attempts: 5,
            mining_workers: 1,
            mining_timeout_secs: None,
            ledger_path: PathBuf::from("ledger.json"),
        }
    }
}

impl AnchorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, ledger: Option<PathBuf>, difficulty: Option<u32>) -> Result<Self> {
        if let Some(ledger) = ledger {
            self.ledger_path = ledger;
        }
        if let Some(difficulty) = difficulty {
            self.difficulty = Difficulty::new(difficulty).context("invalid --difficulty")?;
        }
        Ok(self)
    }

    pub fn append_options(&self) -> AppendOptions {
        AppendOptions {
            difficulty: self.difficulty,
            max_attempts: self.max_attempts,
            mining_workers: self.mining_workers,
            mining_timeout: self.mining_timeout_secs.map(Duration::from_secs),
        }
    }
}
