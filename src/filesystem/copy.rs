// src/filesystem/copy.rs

//! Recursive directory copy with per-entry failure handling

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to do when a single entry fails to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log every failure and keep going
    BestEffort,
    /// Log ordinary failures, abort on permission or disk-space errors
    AbortOnUnexpected,
}

/// Outcome of a tree copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub symlinks: usize,
    pub failed: usize,
}

/// Errors that point at the environment rather than at one file
pub fn is_unexpected(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::StorageFull
    )
}

/// Copy everything under `src` into `dst`, overwriting same-named files
///
/// `dst` is created if absent. Symlinks are recreated, not followed.
pub fn copy_tree(src: &Path, dst: &Path, policy: FailurePolicy) -> Result<CopyStats> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
                let io_err = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop"));
                handle_failure(&path, io_err, policy, &mut stats)?;
                continue;
            }
        };

        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        let file_type = entry.file_type();

        let result = if file_type.is_dir() {
            fs::create_dir_all(&target)
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target).map(|()| stats.symlinks += 1)
        } else {
            copy_file(entry.path(), &target).map(|()| stats.files += 1)
        };

        if let Err(e) = result {
            handle_failure(entry.path(), e, policy, &mut stats)?;
        }
    }

    debug!(
        "Copied {} -> {}: {} files, {} symlinks, {} failed",
        src.display(),
        dst.display(),
        stats.files,
        stats.symlinks,
        stats.failed
    );
    Ok(stats)
}

fn handle_failure(
    path: &Path,
    err: io::Error,
    policy: FailurePolicy,
    stats: &mut CopyStats,
) -> Result<()> {
    if policy == FailurePolicy::AbortOnUnexpected && is_unexpected(&err) {
        return Err(Error::io(path, err));
    }
    warn!("Failed to copy {}: {}", path.display(), err);
    stats.failed += 1;
    Ok(())
}

fn copy_file(src: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    // A symlink left at the target would redirect the write
    if target.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(target)?;
    }
    fs::copy(src, target).map(|_| ())
}

fn copy_symlink(src: &Path, target: &Path) -> io::Result<()> {
    let link_target: PathBuf = fs::read_link(src)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    if let Ok(meta) = target.symlink_metadata() {
        if meta.is_dir() {
            debug!("Skipping symlink over directory: {}", target.display());
            return Ok(());
        }
        fs::remove_file(target)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&link_target, target)
    }

    #[cfg(not(unix))]
    {
        let _ = link_target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symlinks not supported on this platform",
        ))
    }
}
