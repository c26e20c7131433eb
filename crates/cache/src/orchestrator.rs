//! Cache orchestrator
//!
//! The single entry point the execution engine talks to. Composes the
//! [`LocalCacheStore`] with the [`OutputHashTracker`], an optional
//! [`RemoteCache`], and an optional [`CacheMaintenance`] port, and exposes a
//! result-oriented API: look up a hit, decide whether its outputs need
//! restoring, restore them, persist fresh results, and opportunistically
//! trigger pruning.

use crate::config::CacheConfig;
use crate::maintenance::CacheMaintenance;
use crate::remote::RemoteCache;
use crate::store::LocalCacheStore;
use crate::tracker::OutputHashTracker;
use crate::{BestEffort, Result};
use runway_core::{CachedResult, Task};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result cache composing a local store with an optional remote store
pub struct Cache {
    config: CacheConfig,
    store: LocalCacheStore,
    tracker: OutputHashTracker,
    remote: Option<Arc<dyn RemoteCache>>,
    maintenance: Option<Arc<dyn CacheMaintenance>>,
}

impl Cache {
    /// Open a cache over the configured roots, creating the on-disk layout
    /// idempotently
    pub async fn open(config: CacheConfig) -> Result<Self> {
        config.ensure_layout().await?;
        let store = LocalCacheStore::new(config.cache_root(), config.workspace_root());
        let tracker = OutputHashTracker::new(
            config.latest_outputs_hashes_dir(),
            config.workspace_root(),
        );
        Ok(Self {
            config,
            store,
            tracker,
            remote: None,
            maintenance: None,
        })
    }

    /// Attach a remote store consulted on local misses and mirrored on put
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Attach a maintenance port triggered by [`Self::remove_old_cache_records`]
    #[must_use]
    pub fn with_maintenance(mut self, maintenance: Arc<dyn CacheMaintenance>) -> Self {
        self.maintenance = Some(maintenance);
        self
    }

    /// Look up a cached result for the task.
    ///
    /// On a local miss with a remote store configured, the remote is asked to
    /// populate the local root, then the local store is re-checked exactly
    /// once. A failed retrieve is logged and degrades to a miss.
    pub async fn get(&self, task: &Task) -> Result<Option<CachedResult>> {
        if let Some(result) = self.store.get(&task.hash).await? {
            return Ok(Some(result));
        }
        let Some(remote) = &self.remote else {
            return Ok(None);
        };

        debug!(hash = %task.hash, remote = remote.name(), "local miss; asking remote store");
        if let Err(e) = remote.retrieve(&task.hash, self.config.cache_root()).await {
            warn!(
                hash = %task.hash,
                remote = remote.name(),
                error = %e,
                "remote retrieve failed; treating as miss"
            );
            return Ok(None);
        }
        self.store.get(&task.hash).await
    }

    /// Persist an execution result locally, then mirror it to the remote
    /// store if one is configured.
    ///
    /// The mirror call happens strictly after the local commit, and its
    /// failure is logged rather than propagated: a lost mirror costs
    /// cross-machine sharing, never local correctness.
    pub async fn put(
        &self,
        task: &Task,
        terminal_output: Option<&str>,
        outputs: &[String],
        code: i32,
    ) -> Result<()> {
        self.store
            .put(&task.hash, terminal_output, outputs, code)
            .await?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.store(&task.hash, self.config.cache_root()).await {
                warn!(
                    hash = %task.hash,
                    remote = remote.name(),
                    error = %e,
                    "failed to mirror entry to remote store"
                );
            }
        }
        Ok(())
    }

    /// Whether previously restored outputs have drifted and must be re-copied
    pub async fn should_copy_outputs_from_cache(
        &self,
        task: &Task,
        result: &CachedResult,
        outputs: &[String],
    ) -> Result<bool> {
        self.tracker
            .should_copy_outputs_from_cache(&task.hash, result, outputs)
            .await
    }

    /// Restore the entry's outputs into the workspace and record the task
    /// hash against each of them.
    ///
    /// Records are dropped before the copy begins so an interrupted copy
    /// cannot leave a record claiming consistency. `Ok(Degraded)` means the
    /// copy itself succeeded but some records could not be maintained; the
    /// next hit will simply re-copy.
    pub async fn copy_files_from_cache(
        &self,
        task: &Task,
        result: &CachedResult,
        outputs: &[String],
    ) -> Result<BestEffort> {
        let removed = self.tracker.remove_recorded_outputs_hashes(outputs).await;
        self.store.copy_files_from_cache(result, outputs).await?;
        let recorded = self.tracker.record_outputs_hash(outputs, &task.hash).await;
        Ok(removed.and(recorded))
    }

    /// Scratch path for live terminal capture of an in-progress run
    #[must_use]
    pub fn temporary_output_path(&self, task: &Task) -> PathBuf {
        self.config.terminal_outputs_dir().join(&task.hash)
    }

    /// Opportunistically trigger the external pruning routine.
    ///
    /// Launches the maintenance port with probability 1-in-N (N =
    /// [`CacheConfig::prune_interval`]) so maintenance cost is amortized off
    /// the common path. Launch failures are logged and reported as degraded,
    /// never fatal.
    pub async fn remove_old_cache_records(&self) -> BestEffort {
        let Some(maintenance) = &self.maintenance else {
            return BestEffort::Completed;
        };
        let interval = self.config.prune_interval();
        if interval == 0 || fastrand::u32(0..interval) != 0 {
            return BestEffort::Completed;
        }

        match maintenance.launch(self.config.cache_root()).await {
            Ok(()) => BestEffort::Completed,
            Err(e) => {
                warn!(error = %e, "failed to launch cache pruning");
                BestEffort::Degraded
            }
        }
    }
}
