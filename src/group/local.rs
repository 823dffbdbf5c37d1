// src/group/local.rs
//
// In-process group: every rank is a task sharing one tokio barrier.
// Used to simulate a multi-rank run inside a single test binary.

use super::ProcessGroup;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Barrier;

#[derive(Debug, Clone)]
pub struct LocalGroup {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
}

impl LocalGroup {
    /// One handle per rank, index == rank.
    pub fn create(size: usize) -> Vec<LocalGroup> {
        let size = size.max(1);
        let barrier = Arc::new(Barrier::new(size));
        (0..size)
            .map(|rank| LocalGroup {
                rank,
                size,
                barrier: barrier.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ProcessGroup for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn barrier(&self) -> Result<()> {
        self.barrier.wait().await;
        Ok(())
    }
}
