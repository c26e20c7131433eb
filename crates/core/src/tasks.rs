//! Task identity and cached-result values

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A unit of work as the cache sees it.
///
/// The hash is an opaque content fingerprint computed by the engine's hashing
/// layer; the cache never inspects its structure and only uses it as a key
/// and a path component. Declared outputs are workspace-relative paths the
/// task is expected to produce - declared, not observed, so a path may be
/// absent after a given run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque content hash identifying this unit of work
    pub hash: String,
    /// Workspace-relative paths this task declares as outputs
    pub outputs: Vec<String>,
}

impl Task {
    /// Create a task from its hash and declared output paths
    pub fn new(hash: impl Into<String>, outputs: Vec<String>) -> Self {
        Self {
            hash: hash.into(),
            outputs,
        }
    }
}

/// A previously recorded task result, as restored from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    /// Captured stdout/stderr text, or the no-output sentinel
    pub terminal_output: String,
    /// Directory holding the verbatim copies of the task's declared outputs
    pub outputs_path: PathBuf,
    /// Exit code of the recorded run
    pub code: i32,
}

impl CachedResult {
    /// Whether the recorded run exited successfully
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
