// src/coordinator.rs
//
// =============================================================================
// RANKLOG: DISTRIBUTED LOG COORDINATOR (v 0.1 )
// =============================================================================
//
// Lifecycle of the run log across the process group.
//
//   Uninitialized -> DirectoryReady (rank 0) -> Synchronized -> Running
//                 -> Closing -> Closed
//
// start():
// 1. Rank 0 creates the shared log directory and waits until it is visible.
// 2. Workers drop to the worker verbosity floor.
// 3. All ranks meet at the barrier (skipped for single-process runs).
// 4. Workers redirect output and error targets to their own files:
//    <log_dir>/<run>.<rank:04>.stdout / .stderr
//
// close():
// - Rank 0 concatenates worker files into its own streams, in rank order,
//   and deletes them. Read/delete failures are reported, never fatal.
// - Workers flush, close and restore their targets.

use crate::config::RunLogConfig;
use crate::error::{LogError, Result};
use crate::group::ProcessGroup;
use crate::logger::RankLogger;
use crate::stream::{SharedSink, StreamController};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::time::sleep;

// ============================================================================
// 1. TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    DirectoryReady,
    Synchronized,
    Running,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn extension(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }

    fn banner_label(self) -> &'static str {
        match self {
            StreamKind::Stdout => "STDOUT",
            StreamKind::Stderr => "STDERR",
        }
    }
}

/// `<dir>/<run>.<rank as 4 digits>.<stdout|stderr>`
pub fn log_file_path(dir: &Path, run_name: &str, rank: usize, kind: StreamKind) -> PathBuf {
    dir.join(format!("{}.{:04}.{}", run_name, rank, kind.extension()))
}

/// What concatenation did. Failures were already reported through the logger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatReport {
    /// Non-empty streams copied into the coordinator's output, in order.
    pub merged: Vec<(usize, StreamKind)>,
    pub removed: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
    pub uncopied: Vec<PathBuf>,
    pub undeletable: Vec<PathBuf>,
}

impl ConcatReport {
    pub fn is_clean(&self) -> bool {
        self.unreadable.is_empty() && self.uncopied.is_empty() && self.undeletable.is_empty()
    }
}

// ============================================================================
// 2. THE COORDINATOR
// ============================================================================

pub struct LogCoordinator<G: ProcessGroup> {
    group: G,
    logger: Arc<RankLogger>,
    config: RunLogConfig,
    phase: Phase,
    run_name: Option<String>,
    out_ctl: StreamController,
    err_ctl: StreamController,
}

impl<G: ProcessGroup> LogCoordinator<G> {
    /// `logger` must have been built for the same rank as `group`.
    pub fn new(group: G, logger: Arc<RankLogger>, config: RunLogConfig) -> Self {
        let out_ctl = StreamController::new(logger.out().clone());
        let err_ctl = StreamController::new(logger.err().clone());
        Self {
            group,
            logger,
            config,
            phase: Phase::Uninitialized,
            run_name: None,
            out_ctl,
            err_ctl,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn logger(&self) -> &Arc<RankLogger> {
        &self.logger
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    pub fn run_name(&self) -> Option<&str> {
        self.run_name.as_deref()
    }

    /// Path of a rank's log file once the run has a name.
    pub fn log_path(&self, rank: usize, kind: StreamKind) -> Option<PathBuf> {
        self.run_name
            .as_deref()
            .map(|name| log_file_path(&self.config.log_dir, name, rank, kind))
    }

    pub async fn start(&mut self, run_name: &str) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            return Err(LogError::InvalidPhase {
                op: "start",
                phase: self.phase,
            });
        }

        let id = self.group.identity();
        self.run_name = Some(run_name.to_string());

        // A. Shared directory (rank 0 only)
        if id.is_coordinator() {
            self.create_log_dir().await?;
            if id.is_distributed() {
                self.wait_for_log_dir().await?;
            }
            self.phase = Phase::DirectoryReady;
        } else {
            self.logger
                .set_verbosity(self.config.worker_verbosity_input())?;
        }

        // Single process: no barrier, no files
        if !id.is_distributed() {
            self.phase = Phase::Running;
            return Ok(());
        }

        // B. Nobody opens a file before the directory is known to exist
        self.group.barrier().await.map_err(LogError::Barrier)?;
        self.phase = Phase::Synchronized;

        // C. Worker redirection
        if !id.is_coordinator() {
            // Attribute caches on network filesystems can lag behind rank 0
            self.wait_for_log_dir().await?;

            let out_path = log_file_path(&self.config.log_dir, run_name, id.rank, StreamKind::Stdout);
            let err_path = log_file_path(&self.config.log_dir, run_name, id.rank, StreamKind::Stderr);
            let out = SharedSink::create_file(&out_path)?;
            let err = SharedSink::create_file(&err_path)?;
            self.out_ctl.redirect(out);
            self.err_ctl.redirect(err);
            log::debug!("Rank {} logging to {:?}", id.rank, out_path);
        }

        self.phase = Phase::Running;
        Ok(())
    }

    async fn create_log_dir(&self) -> Result<()> {
        match fs::create_dir_all(&self.config.log_dir).await {
            Ok(()) => Ok(()),
            // Someone else got there first
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Polls until the directory is visible, bounded by the configured timeout.
    async fn wait_for_log_dir(&self) -> Result<()> {
        let dir = &self.config.log_dir;
        let timeout = self.config.dir_wait_timeout();
        let started = Instant::now();

        loop {
            match fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => return Ok(()),
                _ => {}
            }
            if started.elapsed() >= timeout {
                return Err(LogError::LogDirUnavailable {
                    path: dir.clone(),
                    waited: started.elapsed(),
                });
            }
            log::debug!("Waiting for log directory {:?} to appear", dir);
            sleep(self.config.dir_poll_interval()).await;
        }
    }

    /// Ends the run log. Safe to call again after it has completed.
    pub async fn close(&mut self) -> Result<ConcatReport> {
        match self.phase {
            Phase::Closed => return Ok(ConcatReport::default()),
            Phase::Uninitialized => {
                return Err(LogError::InvalidPhase {
                    op: "close",
                    phase: self.phase,
                })
            }
            _ => {}
        }
        self.phase = Phase::Closing;

        let id = self.group.identity();
        let mut report = ConcatReport::default();

        if id.is_distributed() {
            if id.is_coordinator() {
                self.close_barrier().await;
                if let Some(name) = self.run_name.clone() {
                    report =
                        concatenate_logs(&self.logger, &self.config.log_dir, &name, id.group_size)
                            .await;
                }
            } else {
                if let Err(e) = self.out_ctl.close() {
                    self.logger
                        .error(format!("Failed to close stdout log of rank {}: {}", id.rank, e));
                }
                if let Err(e) = self.err_ctl.close() {
                    self.logger
                        .error(format!("Failed to close stderr log of rank {}: {}", id.rank, e));
                }
                self.close_barrier().await;
            }

            if let Err(e) = self.group.finish().await {
                self.logger
                    .warning(format!("Process group cleanup incomplete: {:#}", e));
            }
        }

        self.out_ctl.restore();
        self.err_ctl.restore();
        self.logger.flush()?;

        self.phase = Phase::Closed;
        Ok(report)
    }

    async fn close_barrier(&self) {
        if !self.config.close_barrier {
            return;
        }
        if let Err(e) = self.group.barrier().await {
            self.logger
                .error(format!("Close barrier failed, continuing: {:#}", e));
        }
    }
}

// ============================================================================
// 3. CONCATENATION
// ============================================================================

/// Merges worker log files into the coordinator's streams, rank by rank,
/// then deletes them. Missing files are skipped silently; read and delete
/// failures are reported and the loop moves on.
pub async fn concatenate_logs(
    logger: &RankLogger,
    dir: &Path,
    run_name: &str,
    group_size: usize,
) -> ConcatReport {
    let mut report = ConcatReport::default();
    logger.info(format!("Concatenating {} standard streams", group_size));

    for rank in 1..group_size {
        for kind in [StreamKind::Stdout, StreamKind::Stderr] {
            let path = log_file_path(dir, run_name, rank, kind);

            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    logger.warning(format!("Failed to read {}", path.display()));
                    logger.error(e.to_string());
                    report.unreadable.push(path);
                    continue;
                }
            };

            if !bytes.is_empty() {
                let banner = format!(
                    "\n{} RANK {:03} {} {}\n",
                    "-".repeat(10),
                    rank,
                    kind.banner_label(),
                    "-".repeat(60)
                );
                // Worker output may hold arbitrary bytes; copy them as-is
                let mut block = banner.into_bytes();
                block.extend_from_slice(&bytes);
                if block.last() != Some(&b'\n') {
                    block.push(b'\n');
                }

                let written = match kind {
                    StreamKind::Stdout => logger.write_out_bytes(&block),
                    StreamKind::Stderr => logger.write_err_bytes(&block),
                };
                if let Err(e) = written {
                    // Keep the file; it is the only copy
                    logger.warning(format!(
                        "Failed to copy {} into the coordinator output: {}",
                        path.display(),
                        e
                    ));
                    report.uncopied.push(path);
                    continue;
                }
                report.merged.push((rank, kind));
            }

            match fs::remove_file(&path).await {
                Ok(()) => report.removed.push(path),
                Err(e) => {
                    logger.warning(format!("Could not delete {}: {}", path.display(), e));
                    report.undeletable.push(path);
                }
            }
        }
    }

    report
}
