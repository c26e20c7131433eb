//! Filesystem helpers shared by the store and the output hash tracker
//!
//! Missing-path conditions are part of normal cache operation, so removal
//! helpers treat "not found" as success; every other I/O failure propagates.

use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Check for existence, propagating I/O errors other than absence
pub(crate) async fn path_exists(path: &Path) -> Result<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| Error::io(e, path, "stat"))
}

/// Remove a file if it exists; absence is not an error
pub(crate) async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(e, path, "remove_file")),
    }
}

/// Remove a file or directory tree if it exists; absence is not an error
pub(crate) async fn remove_path_if_exists(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(e, path, "stat")),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
            .await
            .map_err(|e| Error::io(e, path, "remove_dir_all"))
    } else {
        remove_file_if_exists(path).await
    }
}

/// Recursively copy a directory tree, creating destination directories
pub(crate) async fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| Error::io(std::io::Error::other(e), src, "walk"))?;
        let rel = entry.path().strip_prefix(src).map_err(|_| {
            Error::configuration(format!(
                "path {} is not under {}",
                entry.path().display(),
                src.display()
            ))
        })?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .await
                .map_err(|e| Error::io(e, &target, "create_dir_all"))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io(e, parent, "create_dir_all"))?;
            }
            fs::copy(entry.path(), &target)
                .await
                .map_err(|e| Error::io(e, &target, "copy"))?;
        }
    }
    Ok(())
}

/// Copy a file or directory tree from `src` to `dst`
pub(crate) async fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src)
        .await
        .map_err(|e| Error::io(e, src, "stat"))?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(e, parent, "create_dir_all"))?;
    }
    if meta.is_dir() {
        copy_tree(src, dst).await
    } else {
        fs::copy(src, dst)
            .await
            .map_err(|e| Error::io(e, dst, "copy"))?;
        Ok(())
    }
}

/// Count the immediate entries of a directory
pub(crate) async fn dir_entry_count(path: &Path) -> Result<usize> {
    let mut reader = fs::read_dir(path)
        .await
        .map_err(|e| Error::io(e, path, "read_dir"))?;
    let mut count = 0;
    while reader
        .next_entry()
        .await
        .map_err(|e| Error::io(e, path, "read_dir_entry"))?
        .is_some()
    {
        count += 1;
    }
    Ok(count)
}
