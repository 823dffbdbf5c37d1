// src/topology.rs
//
// =============================================================================
// RANKLOG: RANK IDENTITY & TOPOLOGY (v 0.1 )
// =============================================================================
//
// Who am I in the process group?
//
// Responsibilities:
// 1. Detect rank and group size from the launcher (Slurm, PMI, Open MPI).
// 2. Decide the role: rank 0 is the coordinator, everyone else a worker.
//
// The identity is fixed at process start and never changes.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    Local,
    Slurm,
    Pmi,
    OpenMpi,
}

/// `{rank, group_size}` of this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankIdentity {
    pub rank: usize,
    pub group_size: usize,
}

impl RankIdentity {
    pub fn new(rank: usize, group_size: usize) -> Self {
        Self {
            rank,
            group_size: group_size.max(1),
        }
    }

    /// Single-process run.
    pub fn solo() -> Self {
        Self::new(0, 1)
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    pub fn is_distributed(&self) -> bool {
        self.group_size > 1
    }

    /// Reads the launcher environment. Falls back to a solo run.
    pub fn detect() -> (Self, Launcher) {
        // Ordered by specificity: a Slurm step may also export PMI vars
        const PROBES: [(&str, &str, Launcher); 3] = [
            ("SLURM_PROCID", "SLURM_NTASKS", Launcher::Slurm),
            ("OMPI_COMM_WORLD_RANK", "OMPI_COMM_WORLD_SIZE", Launcher::OpenMpi),
            ("PMI_RANK", "PMI_SIZE", Launcher::Pmi),
        ];

        for (rank_var, size_var, launcher) in PROBES {
            let rank = env::var(rank_var).ok().and_then(|v| v.trim().parse::<usize>().ok());
            let size = env::var(size_var).ok().and_then(|v| v.trim().parse::<usize>().ok());
            if let (Some(rank), Some(size)) = (rank, size) {
                let id = Self::new(rank, size);
                log::debug!(
                    "Detected {:?} launcher: rank {} of {}",
                    launcher,
                    id.rank,
                    id.group_size
                );
                return (id, launcher);
            }
        }

        (Self::solo(), Launcher::Local)
    }
}

/// Host name for diagnostics; never fails.
pub fn hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "localhost".into())
}

/// Scheduler job id, used to keep rendezvous markers of separate launches apart.
pub fn job_id() -> String {
    if let Ok(job) = env::var("SLURM_JOB_ID") {
        return match env::var("SLURM_STEP_ID") {
            Ok(step) => format!("{}_{}", job, step),
            Err(_) => job,
        };
    }
    if let Ok(job) = env::var("PBS_JOBID") {
        return job.split('.').next().unwrap_or(&job).to_string();
    }
    "local".into()
}
