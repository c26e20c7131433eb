//! Output hash tracking and staleness detection
//!
//! For every declared output path the tracker persists the hash of the task
//! that most recently restored it, one record file per path under
//! `latestOutputsHashes/`. Comparing those records - plus a coarse structural
//! check against the cache entry - answers whether a cache hit's outputs must
//! be re-copied into the workspace or are already in place. Re-copying large
//! output trees on every hit is wasteful, but skipping unconditionally would
//! let stale outputs survive a workspace dirtied out-of-band.

use crate::io;
use crate::{BestEffort, Error, Result};
use runway_core::CachedResult;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

/// Tracks which task hash last populated each declared output path
#[derive(Debug, Clone)]
pub struct OutputHashTracker {
    records_dir: PathBuf,
    workspace_root: PathBuf,
}

impl OutputHashTracker {
    /// Create a tracker storing records in `records_dir` for outputs relative
    /// to `workspace_root`
    pub fn new(records_dir: impl Into<PathBuf>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            records_dir: records_dir.into(),
            workspace_root: workspace_root.into(),
        }
    }

    /// Record file for an output path, separators escaped for a flat directory
    fn record_path(&self, output: &str) -> PathBuf {
        let escaped = output.replace(['/', '\\'], "-");
        self.records_dir.join(format!("{escaped}.hash"))
    }

    /// Record `hash` as the most recent writer of each output path.
    ///
    /// Best-effort: one unwritable record must not block recording the rest,
    /// so failures are logged and reported as a degraded outcome. The cost of
    /// a lost record is a spurious re-copy on the next hit, not wrong data.
    pub async fn record_outputs_hash(&self, outputs: &[String], hash: &str) -> BestEffort {
        let mut outcome = BestEffort::Completed;
        for output in outputs {
            let path = self.record_path(output);
            if let Err(e) = fs::write(&path, hash).await {
                warn!(output = %output, error = %e, "failed to record output hash");
                outcome = BestEffort::Degraded;
            }
        }
        outcome
    }

    /// Delete the records for each output path; missing records are fine
    pub async fn remove_recorded_outputs_hashes(&self, outputs: &[String]) -> BestEffort {
        let mut outcome = BestEffort::Completed;
        for output in outputs {
            if let Err(e) = io::remove_file_if_exists(&self.record_path(output)).await {
                warn!(output = %output, error = %e, "failed to remove output hash record");
                outcome = BestEffort::Degraded;
            }
        }
        outcome
    }

    /// Whether a hit's outputs must be re-copied into the workspace.
    ///
    /// True if any output's recorded hash differs from (or is absent for)
    /// `hash`, or if any output has structurally drifted from the cached copy:
    /// a cached file with no workspace counterpart, a cached directory with no
    /// workspace counterpart, or two directories with a different number of
    /// entries. The directory comparison is a coarse drift signal, not a deep
    /// diff.
    pub async fn should_copy_outputs_from_cache(
        &self,
        hash: &str,
        result: &CachedResult,
        outputs: &[String],
    ) -> Result<bool> {
        if self.recorded_hash_differs(hash, outputs).await {
            return Ok(true);
        }
        self.any_output_missing(result, outputs).await
    }

    async fn recorded_hash_differs(&self, hash: &str, outputs: &[String]) -> bool {
        for output in outputs {
            let path = self.record_path(output);
            match fs::read_to_string(&path).await {
                Ok(recorded) if recorded.trim() == hash => {}
                Ok(_) => return true,
                Err(e) if e.kind() == ErrorKind::NotFound => return true,
                Err(e) => {
                    // Unreadable record: assume stale and force a re-copy.
                    warn!(output = %output, error = %e, "failed to read output hash record");
                    return true;
                }
            }
        }
        false
    }

    async fn any_output_missing(&self, result: &CachedResult, outputs: &[String]) -> Result<bool> {
        for output in outputs {
            let cached = result.outputs_path.join(output);
            let cached_meta = match fs::metadata(&cached).await {
                Ok(meta) => meta,
                // Not in the cache entry: nothing to restore, nothing missing.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(e, &cached, "stat")),
            };

            let workspace = self.workspace_root.join(output);
            if cached_meta.is_file() {
                if !io::path_exists(&workspace).await? {
                    return Ok(true);
                }
                continue;
            }

            let workspace_meta = match fs::metadata(&workspace).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
                Err(e) => return Err(Error::io(e, &workspace, "stat")),
            };
            if !workspace_meta.is_dir() {
                return Ok(true);
            }
            if io::dir_entry_count(&cached).await? != io::dir_entry_count(&workspace).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
