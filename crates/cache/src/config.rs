//! Cache configuration and root-directory resolution
//!
//! The cache root is an explicit configuration value created once per process
//! and handed to [`Cache::open`](crate::Cache::open); nothing in this crate
//! consults process-global state after construction.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Scratch directory for live (not-yet-cached) terminal capture
pub(crate) const TERMINAL_OUTPUTS_DIR: &str = "terminalOutputs";

/// Directory holding one hash record per declared output path
pub(crate) const LATEST_OUTPUTS_HASHES_DIR: &str = "latestOutputsHashes";

/// Default 1-in-N denominator for the opportunistic maintenance trigger
pub const DEFAULT_PRUNE_INTERVAL: u32 = 50;

/// Configuration for a [`Cache`](crate::Cache) instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    workspace_root: PathBuf,
    cache_root: PathBuf,
    prune_interval: u32,
}

impl CacheConfig {
    /// Create a configuration with an explicit cache root
    pub fn new(workspace_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            cache_root: cache_root.into(),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }

    /// Create a configuration, resolving the cache root from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no writable cache directory can be determined.
    pub fn resolve(workspace_root: impl Into<PathBuf>) -> Result<Self> {
        let inputs = CacheDirInputs {
            env_override: std::env::var("RUNWAY_CACHE_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            xdg_cache_home: std::env::var("XDG_CACHE_HOME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            os_cache_dir: dirs::cache_dir(),
            temp_dir: std::env::temp_dir(),
        };
        Ok(Self::new(workspace_root, resolve_cache_root(inputs)?))
    }

    /// Override the 1-in-N maintenance probability denominator
    ///
    /// `0` disables opportunistic maintenance entirely; `1` triggers it on
    /// every invocation (useful in tests).
    pub fn with_prune_interval(mut self, interval: u32) -> Self {
        self.prune_interval = interval;
        self
    }

    /// Directory declared output paths are relative to
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Directory holding cache entries and bookkeeping
    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// The 1-in-N maintenance probability denominator
    #[must_use]
    pub fn prune_interval(&self) -> u32 {
        self.prune_interval
    }

    pub(crate) fn terminal_outputs_dir(&self) -> PathBuf {
        self.cache_root.join(TERMINAL_OUTPUTS_DIR)
    }

    pub(crate) fn latest_outputs_hashes_dir(&self) -> PathBuf {
        self.cache_root.join(LATEST_OUTPUTS_HASHES_DIR)
    }

    /// Create the cache root and its bookkeeping directories, idempotently
    pub(crate) async fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.cache_root.clone(),
            self.terminal_outputs_dir(),
            self.latest_outputs_hashes_dir(),
        ] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::io(e, &dir, "create_dir_all"))?;
        }
        Ok(())
    }
}

/// Inputs for determining the cache root directory
#[derive(Debug, Clone)]
struct CacheDirInputs {
    env_override: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    os_cache_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

fn resolve_cache_root(inputs: CacheDirInputs) -> Result<PathBuf> {
    // Resolution order (first writable wins):
    // 1) RUNWAY_CACHE_DIR (explicit override)
    // 2) XDG_CACHE_HOME/runway/results
    // 3) OS cache dir/runway/results
    // 4) TMPDIR/runway/results (fallback)
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(dir) = inputs.env_override.filter(|p| !p.as_os_str().is_empty()) {
        candidates.push(dir);
    }
    if let Some(xdg) = inputs.xdg_cache_home {
        candidates.push(xdg.join("runway/results"));
    }
    if let Some(os_cache) = inputs.os_cache_dir {
        candidates.push(os_cache.join("runway/results"));
    }
    candidates.push(inputs.temp_dir.join("runway/results"));

    for path in candidates {
        // Nix build sandboxes point HOME at /homeless-shelter
        if path.starts_with("/homeless-shelter") {
            continue;
        }
        // An existing candidate may still be read-only (CI-provided $HOME),
        // so probe before accepting it.
        if path.exists() {
            let probe = path.join(".write_probe");
            match std::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&probe)
            {
                Ok(_) => {
                    let _ = std::fs::remove_file(&probe);
                    return Ok(path);
                }
                Err(_) => continue,
            }
        }
        if std::fs::create_dir_all(&path).is_ok() {
            return Ok(path);
        }
    }
    Err(Error::configuration(
        "Failed to determine a writable cache directory",
    ))
}
