// src/group.rs
//
// =============================================================================
// RANKLOG: PROCESS GROUP PRIMITIVES (v 0.1 )
// =============================================================================
//
// The only cross-process coordination the run log needs: who am I, how many
// of us are there, and a collective barrier.
//
// Implementations:
// - `SoloGroup`:  single process; everything is a no-op.
// - `LocalGroup`: N ranks in one process (tasks/threads), tokio barrier.
// - `FileGroup`:  ranks on a shared filesystem, marker-file rendezvous.

use crate::topology::RankIdentity;
use anyhow::Result;
use async_trait::async_trait;

pub mod file;
pub mod local;

pub use file::FileGroup;
pub use local::LocalGroup;

// ============================================================================
// 1. THE CONTRACT
// ============================================================================

#[async_trait]
pub trait ProcessGroup: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Blocks until every rank has arrived.
    async fn barrier(&self) -> Result<()>;

    /// Releases any resources the group left behind (marker files, ...).
    /// Called once by each rank after its last barrier.
    async fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn identity(&self) -> RankIdentity {
        RankIdentity::new(self.rank(), self.size())
    }
}

// ============================================================================
// 2. SINGLE PROCESS
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SoloGroup;

#[async_trait]
impl ProcessGroup for SoloGroup {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    async fn barrier(&self) -> Result<()> {
        Ok(())
    }
}
