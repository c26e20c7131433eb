//! Maintenance port for opportunistic cache pruning
//!
//! Pruning old entries belongs to an external routine; the cache core only
//! triggers it, probabilistically, from
//! [`Cache::remove_old_cache_records`](crate::Cache::remove_old_cache_records).
//! The port's contract is fire-and-forget: a launch either starts the routine
//! or fails, and the routine's own outcome is never observed or awaited.

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Launches the external cache-pruning routine
#[async_trait]
pub trait CacheMaintenance: Send + Sync {
    /// Start pruning for `cache_root` without awaiting its completion
    async fn launch(&self, cache_root: &Path) -> Result<()>;
}

/// Maintenance port that spawns a detached external program.
///
/// The program is invoked with the cache root path as its sole argument,
/// stdio discarded. The child is deliberately dropped unawaited; the runtime
/// reaps it in the background.
#[derive(Debug, Clone)]
pub struct SubprocessMaintenance {
    program: PathBuf,
}

impl SubprocessMaintenance {
    /// Create a launcher for the given pruning program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CacheMaintenance for SubprocessMaintenance {
    async fn launch(&self, cache_root: &Path) -> Result<()> {
        let child = Command::new(&self.program)
            .arg(cache_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::io(e, &self.program, "spawn"))?;

        debug!(
            program = %self.program.display(),
            pid = ?child.id(),
            "launched cache pruning"
        );
        drop(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn launching_a_missing_program_fails() {
        let tmp = TempDir::new().unwrap();
        let maintenance = SubprocessMaintenance::new(tmp.path().join("no-such-program"));
        assert!(maintenance.launch(tmp.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_spawns_detached() {
        let tmp = TempDir::new().unwrap();
        let maintenance = SubprocessMaintenance::new("true");
        maintenance.launch(tmp.path()).await.unwrap();
    }
}
