// src/main.rs
//
// =============================================================================
// RANKLOG: COMMANDER & ENTRY POINT (v 0.1 )
// =============================================================================
//
// Modes:
// 1. LEVELS: Prints the severity table.
// 2. RUN:    Smoke-tests the run log across a launched process group
//            (e.g. `srun -n 8 ranklog run --name smoke`).
// 3. CONCAT: Salvages worker logs left behind by an aborted run.
//
// Key Features:
// - Auto-Detection of Roles (Rank 0 vs Rank N).
// - File rendezvous barrier on shared filesystems.
// - Graceful Shutdown handling (logs are still merged after Ctrl-C).

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ranklog::group::{FileGroup, ProcessGroup, SoloGroup};
use ranklog::logs::LogBridge;
use ranklog::topology::{self, RankIdentity};
use ranklog::{concatenate_logs, LogCoordinator, RankLogger, RunLogConfig, Severity, VerbosityTable};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;

// ============================================================================
// 1. CLI DEFINITION
// ============================================================================

#[derive(Parser)]
#[command(
    name = "ranklog",
    version,
    about = "Rank-aware run logging for multi-process simulations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the severity table.
    Levels,

    /// Start the run log on every rank, log a few heartbeats, then merge.
    Run {
        /// Run name (log files are <log-dir>/<name>.<rank>.stdout|stderr).
        #[arg(long)]
        name: String,

        /// YAML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Coordinator verbosity (name or rank).
        #[arg(long)]
        verbosity: Option<String>,

        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Heartbeat lines per rank.
        #[arg(long, default_value_t = 3)]
        beats: u32,
    },

    /// Merge and delete worker logs of a run that never reached close.
    Concat {
        #[arg(long)]
        name: String,

        /// Group size of the original run.
        #[arg(long)]
        size: usize,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

// ============================================================================
// 2. ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Levels => {
            print_levels();
            Ok(())
        }
        Commands::Run {
            name,
            config,
            verbosity,
            log_dir,
            beats,
        } => {
            let mut cfg = load_config(config, log_dir)?;
            if let Some(v) = verbosity {
                cfg.verbosity = v;
            }
            cfg.validate()?;
            run_session(name, cfg, beats).await
        }
        Commands::Concat {
            name,
            size,
            config,
            log_dir,
        } => {
            let cfg = load_config(config, log_dir)?;
            run_salvage(name, size, cfg).await
        }
    }
}

fn load_config(path: Option<PathBuf>, log_dir: Option<PathBuf>) -> Result<RunLogConfig> {
    let mut cfg = match path {
        Some(p) => RunLogConfig::load(&p)?,
        None => RunLogConfig::default(),
    };
    if let Some(dir) = log_dir {
        cfg.log_dir = dir;
    }
    Ok(cfg)
}

fn print_levels() {
    let table = VerbosityTable::new(0);
    println!("{:<10} {:>5}  PREFIX", "NAME", "RANK");
    for sev in Severity::ALL {
        println!("{:<10} {:>5}  {:?}", sev.name(), sev.rank(), table.prefix(sev));
    }
}

// ============================================================================
// 3. RUNTIME: LOGGED SESSION
// ============================================================================

async fn run_session(name: String, mut cfg: RunLogConfig, beats: u32) -> Result<()> {
    let (identity, launcher) = RankIdentity::detect();

    let logger = Arc::new(RankLogger::console(identity));
    logger.set_verbosity(cfg.verbosity_input())?;

    // Route `log::` macros (ours and dependencies') through the rank logger
    LogBridge::init(logger.clone()).ok();

    // We own both ends of the run here, so order close explicitly
    cfg.close_barrier = true;

    if identity.is_distributed() {
        let tag = format!("{}.{}", name, topology::job_id());
        let group = FileGroup::new(
            identity,
            &cfg.rendezvous_dir,
            &tag,
            cfg.dir_poll_interval(),
            cfg.barrier_timeout(),
        );
        log::debug!("Using file rendezvous ({:?} launcher) tag {}", launcher, tag);
        drive(group, logger, cfg, &name, beats).await
    } else {
        drive(SoloGroup, logger, cfg, &name, beats).await
    }
}

async fn drive<G: ProcessGroup>(
    group: G,
    logger: Arc<RankLogger>,
    cfg: RunLogConfig,
    name: &str,
    beats: u32,
) -> Result<()> {
    let id = group.identity();
    let mut coord = LogCoordinator::new(group, logger.clone(), cfg);
    coord.start(name).await.context("Run log start")?;

    if id.is_coordinator() {
        logger.raw(format!("========== RANKLOG: {} ==========", name));
    }
    logger.info(format!(
        "Rank {} of {} on {}",
        id.rank,
        id.group_size,
        topology::hostname()
    ));

    let work = async {
        for beat in 0..beats {
            logger.info(format!("Heartbeat {} from rank {}", beat, id.rank));
            logger.warning_single(
                format!("Rank {} is running a smoke test", id.rank),
                Some("smoke-test"),
            );
            sleep(Duration::from_millis(200)).await;
        }
    };

    tokio::select! {
        _ = work => {}
        _ = signal::ctrl_c() => {
            logger.warning("Interrupt received. Closing run log...");
        }
    }

    logger.warning_report();
    let report = coord.close().await.context("Run log close")?;

    if id.is_coordinator() && id.is_distributed() {
        logger.info(format!(
            "Merged {} streams, removed {} files",
            report.merged.len(),
            report.removed.len()
        ));
        if !report.is_clean() {
            logger.warning(format!("Concatenation left files behind: {:?}", report));
        }
    }
    Ok(())
}

// ============================================================================
// 4. SALVAGE: MERGE LEFTOVER WORKER LOGS
// ============================================================================

async fn run_salvage(name: String, size: usize, cfg: RunLogConfig) -> Result<()> {
    if size < 2 {
        return Err(anyhow!("Nothing to concatenate for a group of size {}", size));
    }

    let logger = RankLogger::console(RankIdentity::solo());
    logger.set_verbosity(cfg.verbosity_input())?;

    let report = concatenate_logs(&logger, &cfg.log_dir, &name, size).await;
    logger.flush()?;

    if !report.is_clean() {
        return Err(anyhow!(
            "{} unreadable, {} uncopied, {} undeletable log files",
            report.unreadable.len(),
            report.uncopied.len(),
            report.undeletable.len()
        ));
    }
    Ok(())
}
