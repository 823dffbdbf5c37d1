// src/lib.rs
//
// =============================================================================
// RANKLOG: LIBRARY ROOT
// =============================================================================
//
// This file declares the module tree and exports public types.

// 1. Declare Modules
pub mod config;
pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod group;
pub mod logger;
pub mod logs;
pub mod prompt;
pub mod severity;
pub mod stream;
pub mod topology;

// 2. Re-exports (The Public API)
// These allow `use ranklog::RankLogger` or `use ranklog::LogCoordinator` to work elsewhere.

pub use config::RunLogConfig;
pub use coordinator::{concatenate_logs, log_file_path, ConcatReport, LogCoordinator, Phase, StreamKind};
pub use dedup::{MessageDeduplicator, SeverityClass};
pub use error::LogError;
pub use group::{FileGroup, LocalGroup, ProcessGroup, SoloGroup};
pub use logger::RankLogger;
pub use logs::{LogBridge, LogBuffer};
pub use prompt::{Choice, ConsoleResponder, DialogResponder, Responder, RunMode};
pub use severity::{Severity, VerbosityInput, VerbosityTable};
pub use stream::{SharedSink, StreamController, StreamSlot};
pub use topology::{Launcher, RankIdentity};
