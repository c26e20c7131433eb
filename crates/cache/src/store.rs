//! Local on-disk cache store
//!
//! One directory per task hash, committed by a sidecar marker file. Directory
//! creation and multi-file population are not atomic on typical filesystems,
//! so the marker's existence is the sole signal that an entry is complete:
//! readers that find no marker treat the entry as absent no matter what
//! partial files exist, and writers create the marker as the final step of
//! [`LocalCacheStore::put`]. A process killed mid-write therefore leaves an
//! invisible entry that the next `put` for the same hash cleans up.

use crate::io;
use crate::{Error, Result};
use runway_core::CachedResult;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// File holding the captured stdout/stderr text of an entry
const TERMINAL_OUTPUT_FILE: &str = "terminalOutput";

/// File holding the decimal exit code of an entry
const CODE_FILE: &str = "code";

/// Subdirectory holding verbatim copies of the declared outputs
const OUTPUTS_DIR: &str = "outputs";

/// Placeholder written when a task produced no captured output
const NO_TERMINAL_OUTPUT: &str = "no terminal output";

/// Atomic, crash-safe persistence of one cache entry per task hash
#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    cache_root: PathBuf,
    workspace_root: PathBuf,
}

impl LocalCacheStore {
    /// Create a store over the given cache root and workspace root
    pub fn new(cache_root: impl Into<PathBuf>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            workspace_root: workspace_root.into(),
        }
    }

    fn entry_dir(&self, hash: &str) -> PathBuf {
        self.cache_root.join(hash)
    }

    fn commit_marker(&self, hash: &str) -> PathBuf {
        self.cache_root.join(format!("{hash}.commit"))
    }

    /// The hash is an opaque key, but it becomes a path component; reject
    /// anything that would escape the cache root.
    fn validate_hash(hash: &str) -> Result<()> {
        if hash.is_empty()
            || hash == "."
            || hash == ".."
            || hash.contains(['/', '\\'])
        {
            return Err(Error::configuration(format!(
                "task hash {hash:?} is not filesystem-safe"
            )));
        }
        Ok(())
    }

    /// Retrieve a committed entry, or `None` on a miss.
    ///
    /// Absence of the commit marker is an ordinary miss. A marker whose
    /// terminal output cannot be read back is a corruption condition and
    /// surfaces as [`Error::CorruptedEntry`]; an unreadable or unparseable
    /// `code` file defaults to exit code 0.
    pub async fn get(&self, hash: &str) -> Result<Option<CachedResult>> {
        Self::validate_hash(hash)?;
        if !io::path_exists(&self.commit_marker(hash)).await? {
            debug!(hash = %hash, "local cache miss");
            return Ok(None);
        }

        let entry = self.entry_dir(hash);
        let terminal_output = fs::read_to_string(entry.join(TERMINAL_OUTPUT_FILE))
            .await
            .map_err(|e| Error::corrupted(hash, e))?;
        let code = match fs::read_to_string(entry.join(CODE_FILE)).await {
            Ok(text) => text.trim().parse().unwrap_or(0),
            Err(_) => 0,
        };

        debug!(hash = %hash, code, "local cache hit");
        Ok(Some(CachedResult {
            terminal_output,
            outputs_path: entry.join(OUTPUTS_DIR),
            code,
        }))
    }

    /// Persist a task result, committing it only once fully written.
    ///
    /// The write order is the correctness contract: leftover marker and entry
    /// from any earlier write are removed first, then the entry contents are
    /// written, and the commit marker is created last. Declared outputs that
    /// do not exist in the workspace are skipped.
    pub async fn put(
        &self,
        hash: &str,
        terminal_output: Option<&str>,
        outputs: &[String],
        code: i32,
    ) -> Result<()> {
        Self::validate_hash(hash)?;
        let entry = self.entry_dir(hash);
        let marker = self.commit_marker(hash);

        // Marker before contents: the reverse order would briefly advertise
        // a gutted entry to concurrent readers.
        io::remove_file_if_exists(&marker).await?;
        io::remove_path_if_exists(&entry).await?;

        fs::create_dir_all(&entry)
            .await
            .map_err(|e| Error::io(e, &entry, "create_dir_all"))?;
        let terminal_path = entry.join(TERMINAL_OUTPUT_FILE);
        fs::write(&terminal_path, terminal_output.unwrap_or(NO_TERMINAL_OUTPUT))
            .await
            .map_err(|e| Error::io(e, &terminal_path, "write"))?;

        let outputs_dir = entry.join(OUTPUTS_DIR);
        fs::create_dir_all(&outputs_dir)
            .await
            .map_err(|e| Error::io(e, &outputs_dir, "create_dir_all"))?;
        for output in outputs {
            let src = self.workspace_root.join(output);
            if !io::path_exists(&src).await? {
                debug!(output = %output, "declared output not produced; skipping");
                continue;
            }
            io::copy_path(&src, &outputs_dir.join(output)).await?;
        }

        let code_path = entry.join(CODE_FILE);
        fs::write(&code_path, code.to_string())
            .await
            .map_err(|e| Error::io(e, &code_path, "write"))?;

        // The single write that flips the entry from invisible to visible.
        fs::write(&marker, b"")
            .await
            .map_err(|e| Error::io(e, &marker, "write"))?;

        debug!(hash = %hash, code, "cache entry committed");
        Ok(())
    }

    /// Materialize cached copies of the declared outputs into the workspace.
    ///
    /// Each existing workspace copy is deleted before its cached counterpart
    /// is copied over, so a shrunken output set never leaves a mix of old and
    /// new files behind. Outputs absent from the cache entry are skipped.
    pub async fn copy_files_from_cache(
        &self,
        result: &CachedResult,
        outputs: &[String],
    ) -> Result<()> {
        for output in outputs {
            let cached = result.outputs_path.join(output);
            if !io::path_exists(&cached).await? {
                continue;
            }
            let destination = self.workspace_root.join(output);
            io::remove_path_if_exists(&destination).await?;
            io::copy_path(&cached, &destination).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        store: LocalCacheStore,
        cache_root: PathBuf,
        workspace: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let cache_root = tmp.path().join("cache");
        let workspace = tmp.path().join("workspace");
        std::fs::create_dir_all(&cache_root).unwrap();
        std::fs::create_dir_all(&workspace).unwrap();
        let store = LocalCacheStore::new(&cache_root, &workspace);
        Fixture {
            _tmp: tmp,
            store,
            cache_root,
            workspace,
        }
    }

    #[tokio::test]
    async fn get_on_empty_root_is_a_miss() {
        let f = fixture();
        assert!(f.store.get("123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_entry_without_marker_is_a_miss() {
        let f = fixture();
        // Simulate an interrupted put: entry files present, no marker.
        let entry = f.cache_root.join("123");
        std::fs::create_dir_all(entry.join("outputs")).unwrap();
        std::fs::write(entry.join("terminalOutput"), "partial").unwrap();
        std::fs::write(entry.join("code"), "0").unwrap();

        assert!(f.store.get("123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let f = fixture();
        std::fs::create_dir_all(f.workspace.join("dist")).unwrap();
        std::fs::write(f.workspace.join("dist/a.txt"), b"artifact").unwrap();

        f.store
            .put("123", Some("hello"), &["dist/a.txt".to_string()], 0)
            .await
            .unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert_eq!(result.terminal_output, "hello");
        assert_eq!(result.code, 0);
        assert_eq!(
            std::fs::read(result.outputs_path.join("dist/a.txt")).unwrap(),
            b"artifact"
        );
    }

    #[tokio::test]
    async fn put_skips_outputs_the_task_did_not_produce() {
        let f = fixture();
        f.store
            .put("123", Some("out"), &["dist/never-made.txt".to_string()], 0)
            .await
            .unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert!(!result.outputs_path.join("dist/never-made.txt").exists());
    }

    #[tokio::test]
    async fn put_overwrites_without_residue() {
        let f = fixture();
        std::fs::create_dir_all(f.workspace.join("dist")).unwrap();
        std::fs::write(f.workspace.join("dist/old.txt"), b"old").unwrap();
        f.store
            .put("123", Some("first"), &["dist/old.txt".to_string()], 1)
            .await
            .unwrap();

        std::fs::remove_file(f.workspace.join("dist/old.txt")).unwrap();
        std::fs::write(f.workspace.join("dist/new.txt"), b"new").unwrap();
        f.store
            .put("123", Some("second"), &["dist/new.txt".to_string()], 0)
            .await
            .unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert_eq!(result.terminal_output, "second");
        assert_eq!(result.code, 0);
        assert!(result.outputs_path.join("dist/new.txt").exists());
        assert!(!result.outputs_path.join("dist/old.txt").exists());
    }

    #[tokio::test]
    async fn missing_terminal_output_uses_sentinel() {
        let f = fixture();
        f.store.put("123", None, &[], 0).await.unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert_eq!(result.terminal_output, NO_TERMINAL_OUTPUT);
    }

    #[tokio::test]
    async fn unparseable_code_defaults_to_success() {
        let f = fixture();
        f.store.put("123", Some("x"), &[], 7).await.unwrap();
        std::fs::write(f.cache_root.join("123/code"), "not a number").unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert_eq!(result.code, 0);
    }

    #[tokio::test]
    async fn committed_entry_with_unreadable_output_surfaces_corruption() {
        let f = fixture();
        f.store.put("123", Some("x"), &[], 0).await.unwrap();
        std::fs::remove_file(f.cache_root.join("123/terminalOutput")).unwrap();

        let err = f.store.get("123").await.unwrap_err();
        assert!(matches!(err, Error::CorruptedEntry { .. }));
    }

    #[tokio::test]
    async fn directory_outputs_roundtrip() {
        let f = fixture();
        std::fs::create_dir_all(f.workspace.join("dist/assets")).unwrap();
        std::fs::write(f.workspace.join("dist/index.html"), b"<html>").unwrap();
        std::fs::write(f.workspace.join("dist/assets/app.js"), b"js").unwrap();

        f.store
            .put("123", Some("built"), &["dist".to_string()], 0)
            .await
            .unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        assert_eq!(
            std::fs::read(result.outputs_path.join("dist/assets/app.js")).unwrap(),
            b"js"
        );
    }

    #[tokio::test]
    async fn copy_from_cache_replaces_stale_workspace_state() {
        let f = fixture();
        std::fs::create_dir_all(f.workspace.join("dist")).unwrap();
        std::fs::write(f.workspace.join("dist/keep.txt"), b"keep").unwrap();
        f.store
            .put("123", Some("x"), &["dist".to_string()], 0)
            .await
            .unwrap();

        // The workspace drifts: an extra file appears that the cached entry
        // does not contain.
        std::fs::write(f.workspace.join("dist/stale.txt"), b"stale").unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        f.store
            .copy_files_from_cache(&result, &["dist".to_string()])
            .await
            .unwrap();

        assert!(f.workspace.join("dist/keep.txt").exists());
        assert!(!f.workspace.join("dist/stale.txt").exists());
    }

    #[tokio::test]
    async fn copy_from_cache_is_idempotent() {
        let f = fixture();
        std::fs::create_dir_all(f.workspace.join("dist")).unwrap();
        std::fs::write(f.workspace.join("dist/a.txt"), b"a").unwrap();
        f.store
            .put("123", Some("x"), &["dist/a.txt".to_string()], 0)
            .await
            .unwrap();

        let result = f.store.get("123").await.unwrap().unwrap();
        let outputs = vec!["dist/a.txt".to_string()];
        f.store.copy_files_from_cache(&result, &outputs).await.unwrap();
        f.store.copy_files_from_cache(&result, &outputs).await.unwrap();

        assert_eq!(std::fs::read(f.workspace.join("dist/a.txt")).unwrap(), b"a");
    }

    #[tokio::test]
    async fn hash_with_path_separator_is_rejected() {
        let f = fixture();
        let err = f.store.get("../escape").await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = f.store.put("a/b", None, &[], 0).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
