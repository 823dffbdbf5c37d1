// src/group/file.rs
//
// =============================================================================
// RANKLOG: FILE RENDEZVOUS (v 0.1 )
// =============================================================================
//
// A barrier for ranks that share nothing but a filesystem (Lustre/GPFS/NFS).
//
// Protocol for barrier generation `g`:
// 1. Every rank drops `<tag>.<g>.arrive.<rank>`.
// 2. Rank 0 waits for all arrivals, then drops `<tag>.<g>.release`.
// 3. Workers wait for the release and delete their own arrival (the ack).
// 4. Rank 0 deletes `release` of `g` once all acks are in (at barrier g+1 or
//    in `finish`).
//
// Markers are written to a temp name and renamed so they appear whole.

use super::ProcessGroup;
use crate::topology::{hostname, RankIdentity};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::time::sleep;

#[derive(Debug, Serialize, Deserialize)]
struct Marker {
    rank: usize,
    host: String,
    ts_ms: i64,
}

pub struct FileGroup {
    identity: RankIdentity,
    dir: PathBuf,
    tag: String,
    generation: AtomicU64,
    poll: Duration,
    timeout: Duration,
}

impl FileGroup {
    /// `tag` must be unique per launch (e.g. run name + scheduler job id),
    /// otherwise markers from an aborted launch could release a new one.
    pub fn new(
        identity: RankIdentity,
        dir: impl AsRef<Path>,
        tag: &str,
        poll: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            dir: dir.as_ref().to_path_buf(),
            tag: tag.to_string(),
            generation: AtomicU64::new(0),
            poll,
            timeout,
        }
    }

    fn arrive_path(&self, gen: u64, rank: usize) -> PathBuf {
        self.dir
            .join(format!("{}.{}.arrive.{:04}", self.tag, gen, rank))
    }

    fn release_path(&self, gen: u64) -> PathBuf {
        self.dir.join(format!("{}.{}.release", self.tag, gen))
    }

    async fn drop_marker(&self, path: &Path) -> Result<()> {
        let marker = Marker {
            rank: self.identity.rank,
            host: hostname(),
            ts_ms: chrono::Utc::now().timestamp_millis(),
        };
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, serde_json::to_vec(&marker)?)
            .await
            .with_context(|| format!("Failed to write marker {:?}", tmp))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to publish marker {:?}", path))?;
        Ok(())
    }

    /// Polls until `ready` holds, bounded by the group timeout.
    async fn wait_until<F>(&self, what: &str, mut ready: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        let started = Instant::now();
        while !ready() {
            if started.elapsed() > self.timeout {
                return Err(anyhow!(
                    "rank {} timed out after {:?} waiting for {}",
                    self.identity.rank,
                    self.timeout,
                    what
                ));
            }
            sleep(self.poll).await;
        }
        Ok(())
    }

    /// Rank 0 only: waits for every worker's ack of `gen`, then removes
    /// its release marker.
    async fn retire(&self, gen: u64) -> Result<()> {
        let pending: Vec<PathBuf> = (1..self.identity.group_size)
            .map(|r| self.arrive_path(gen, r))
            .collect();
        self.wait_until(&format!("acks of barrier {}", gen), || {
            pending.iter().all(|p| !p.exists())
        })
        .await?;

        if let Err(e) = fs::remove_file(self.release_path(gen)).await {
            log::warn!("Could not remove release marker {}: {}", gen, e);
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessGroup for FileGroup {
    fn rank(&self) -> usize {
        self.identity.rank
    }

    fn size(&self) -> usize {
        self.identity.group_size
    }

    async fn barrier(&self) -> Result<()> {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst);
        let size = self.identity.group_size;
        if size == 1 {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create rendezvous dir {:?}", self.dir))?;

        let mine = self.arrive_path(gen, self.identity.rank);
        self.drop_marker(&mine).await?;
        log::debug!("Rank {} arrived at barrier {}", self.identity.rank, gen);

        if self.identity.is_coordinator() {
            let arrivals: Vec<PathBuf> = (0..size).map(|r| self.arrive_path(gen, r)).collect();
            self.wait_until(&format!("arrivals at barrier {}", gen), || {
                arrivals.iter().all(|p| p.exists())
            })
            .await?;

            // Everyone reached `gen`, so everyone acked `gen - 1`
            if gen > 0 {
                if let Err(e) = fs::remove_file(self.release_path(gen - 1)).await {
                    log::debug!("Release marker {} already gone: {}", gen - 1, e);
                }
            }

            self.drop_marker(&self.release_path(gen)).await?;
            fs::remove_file(&mine).await.ok();
        } else {
            let release = self.release_path(gen);
            self.wait_until(&format!("release of barrier {}", gen), || release.exists())
                .await?;
            fs::remove_file(&mine)
                .await
                .with_context(|| format!("Failed to ack barrier {}", gen))?;
        }

        log::debug!("Rank {} passed barrier {}", self.identity.rank, gen);
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        let used = self.generation.load(Ordering::SeqCst);
        if !self.identity.is_coordinator() || self.identity.group_size == 1 || used == 0 {
            return Ok(());
        }
        self.retire(used - 1).await
    }
}
