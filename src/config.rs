// src/config.rs
//
// =============================================================================
// RANKLOG: RUN CONFIGURATION (v 0.1 )
// =============================================================================
//
// Every field has a default, so an empty YAML file (or no file) is valid.
// CLI flags override whatever the file says.

use crate::error::Result as LogResult;
use crate::severity::{VerbosityInput, VerbosityTable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLogConfig {
    /// Shared directory for per-rank log files.
    pub log_dir: PathBuf,
    /// Threshold for the coordinator.
    pub verbosity: String,
    /// Threshold workers drop to at start (keeps many-rank runs quiet).
    pub worker_verbosity: String,
    pub dir_poll_interval_ms: u64,
    /// Upper bound on waiting for the log directory to become visible.
    pub dir_wait_timeout_secs: u64,
    /// Synchronize once more at close so workers finish writing before the
    /// coordinator concatenates.
    pub close_barrier: bool,
    /// Marker directory for the file-based process group.
    pub rendezvous_dir: PathBuf,
    pub barrier_timeout_secs: u64,
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            verbosity: "info".into(),
            worker_verbosity: "warning".into(),
            dir_poll_interval_ms: 100,
            dir_wait_timeout_secs: 30,
            close_barrier: false,
            rendezvous_dir: PathBuf::from(".ranklog"),
            barrier_timeout_secs: 600,
        }
    }
}

impl RunLogConfig {
    /// Loads a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let cfg: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config YAML: {:?}", path))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks both verbosity names against the severity table.
    pub fn validate(&self) -> LogResult<()> {
        VerbosityTable::resolve(&self.verbosity_input())?;
        VerbosityTable::resolve(&self.worker_verbosity_input())?;
        Ok(())
    }

    pub fn verbosity_input(&self) -> VerbosityInput {
        parse_verbosity(&self.verbosity)
    }

    pub fn worker_verbosity_input(&self) -> VerbosityInput {
        parse_verbosity(&self.worker_verbosity)
    }

    pub fn dir_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dir_poll_interval_ms.max(1))
    }

    pub fn dir_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.dir_wait_timeout_secs)
    }

    pub fn barrier_timeout(&self) -> Duration {
        Duration::from_secs(self.barrier_timeout_secs)
    }
}

/// "30" is a rank, anything else a name.
pub fn parse_verbosity(text: &str) -> VerbosityInput {
    match text.trim().parse::<u32>() {
        Ok(rank) => VerbosityInput::Rank(rank),
        Err(_) => VerbosityInput::Name(text.to_string()),
    }
}
