// src/error.rs
//
// =============================================================================
// RANKLOG: ERROR TAXONOMY (v 0.1 )
// =============================================================================
//
// Caller bugs (unknown levels, bad verbosity) are fatal and surface as errors.
// Cleanup problems during concatenation never reach this type; they are
// reported through the logger and the run carries on.

use crate::coordinator::Phase;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    /// Severity name outside the fixed table.
    #[error("{0:?} is not a valid verbosity level. Choose from {1:?}")]
    UnknownLevel(String, Vec<&'static str>),

    /// Verbosity set to a rank or name that is not one of the fixed ranks.
    #[error("Invalid verbosity {0}. Valid options are: {1:?}")]
    InvalidVerbosity(String, Vec<u32>),

    /// Prompt issued where nobody can answer it.
    #[error("Cannot prompt the user: {0}")]
    PromptUnresolvable(String),

    #[error("Prompt cancelled: {0}")]
    PromptCancelled(String),

    #[error("No suitable responses in {0:?}")]
    NoPromptChoices(Vec<String>),

    #[error("Log directory {path:?} did not appear within {waited:?}")]
    LogDirUnavailable { path: PathBuf, waited: Duration },

    #[error("Cannot {op} while the run log is {phase:?}")]
    InvalidPhase { op: &'static str, phase: Phase },

    #[error("Process group barrier failed: {0:#}")]
    Barrier(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;
