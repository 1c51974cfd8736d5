// src/snapshot.rs

//! Point-in-time capture of the user's editor state
//!
//! A snapshot copies the configuration and extension directories into a
//! timestamped backup directory and records the installed extension ids.
//! The backup directory also receives `snapshot.json` (the snapshot itself)
//! and `extensions.txt` (one id per line), so it stays useful after the
//! process exits.

use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use crate::filesystem::{copy_tree, FailurePolicy};
use crate::runner::{CommandRunner, CommandSpec};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the serialized snapshot inside the backup directory
pub const MANIFEST_FILE: &str = "snapshot.json";

/// Flat extension list inside the backup directory
pub const EXTENSIONS_FILE: &str = "extensions.txt";

/// Timestamp tag shared by backup directories and settings backups
pub fn backup_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// Captured user state; read-only once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationSnapshot {
    config_dir: Option<PathBuf>,
    extensions_dir: Option<PathBuf>,
    extension_ids: Vec<String>,
    created_at: DateTime<Local>,
    backup_root: PathBuf,
}

impl InstallationSnapshot {
    /// Snapshot that captured nothing
    pub fn empty(backup_root: PathBuf, created_at: DateTime<Local>) -> Self {
        Self {
            config_dir: None,
            extensions_dir: None,
            extension_ids: Vec::new(),
            created_at,
            backup_root,
        }
    }

    /// Backup copy of the configuration directory, if one was taken
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Backup copy of the extensions directory, if one was taken
    pub fn extensions_dir(&self) -> Option<&Path> {
        self.extensions_dir.as_deref()
    }

    /// Extension ids in the order the editor listed them
    pub fn extension_ids(&self) -> &[String] {
        &self.extension_ids
    }

    pub fn created_at(&self) -> &DateTime<Local> {
        &self.created_at
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn is_empty(&self) -> bool {
        self.config_dir.is_none() && self.extensions_dir.is_none() && self.extension_ids.is_empty()
    }

    /// Read a snapshot back from its backup directory
    pub fn load(backup_root: &Path) -> Result<Self> {
        let path = backup_root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_manifest(&self) -> Result<()> {
        let manifest = self.backup_root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&manifest, json).map_err(|e| Error::io(&manifest, e))?;

        let list = self.backup_root.join(EXTENSIONS_FILE);
        let mut content = self.extension_ids.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&list, content).map_err(|e| Error::io(&list, e))?;
        Ok(())
    }
}

/// Ask the editor for its installed extensions
///
/// Any failure yields an empty list and a warning.
pub fn list_extensions(config: &MigrationConfig, runner: &mut dyn CommandRunner) -> Vec<String> {
    let Some(binary) = runner.resolve(&config.binary) else {
        warn!("'{}' not found on PATH; extension list not captured", config.binary);
        return Vec::new();
    };

    let spec = CommandSpec::new(binary.to_string_lossy()).arg("--list-extensions");
    match runner.run(&spec) {
        Ok(output) if output.success() => output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Ok(output) => {
            warn!("Listing extensions failed: {}", output.stderr.trim());
            Vec::new()
        }
        Err(e) => {
            warn!("Listing extensions failed: {}", e);
            Vec::new()
        }
    }
}

/// Capture configuration, extensions, and the extension list
///
/// `config_path` and `extensions_path` need not exist. The backup directory
/// is `<backup_parent>/<prefix>-<stamp>` and is only created when there is
/// something to keep.
pub fn capture_snapshot(
    config: &MigrationConfig,
    config_path: &Path,
    extensions_path: &Path,
    runner: &mut dyn CommandRunner,
    created_at: DateTime<Local>,
) -> Result<InstallationSnapshot> {
    let backup_root = config.paths.backup_parent.join(format!(
        "{}-{}",
        config.paths.backup_prefix,
        backup_stamp(&created_at)
    ));

    let extension_ids = list_extensions(config, runner);
    let has_config = path_is_dir(config_path);
    let has_extensions = path_is_dir(extensions_path);

    let mut snapshot = InstallationSnapshot::empty(backup_root, created_at);
    snapshot.extension_ids = extension_ids;

    if !has_config && !has_extensions && snapshot.extension_ids.is_empty() {
        info!("Nothing to back up");
        return Ok(snapshot);
    }

    fs::create_dir_all(&snapshot.backup_root).map_err(|e| Error::io(&snapshot.backup_root, e))?;
    info!("Backing up to {}", snapshot.backup_root.display());

    if has_config {
        let dest = snapshot.backup_root.join("config");
        let stats = copy_tree(config_path, &dest, FailurePolicy::AbortOnUnexpected)?;
        info!("Backed up configuration ({} files)", stats.files);
        snapshot.config_dir = Some(dest);
    } else {
        warn!("No configuration found at {}", config_path.display());
    }

    if has_extensions {
        let dest = snapshot.backup_root.join("extensions");
        let stats = copy_tree(extensions_path, &dest, FailurePolicy::AbortOnUnexpected)?;
        info!("Backed up extensions directory ({} files)", stats.files);
        snapshot.extensions_dir = Some(dest);
    } else {
        warn!("No extensions directory found at {}", extensions_path.display());
    }

    snapshot.write_manifest()?;
    Ok(snapshot)
}

fn path_is_dir(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}
