// src/restore.rs

//! Repopulating a fresh installation from a snapshot
//!
//! Restore is best-effort throughout: a file that can't be copied or an
//! extension that won't install is logged and skipped.

use crate::config::MigrationConfig;
use crate::error::Result;
use crate::filesystem::{copy_tree, CopyStats, FailurePolicy};
use crate::runner::{CommandRunner, CommandSpec};
use crate::snapshot::InstallationSnapshot;
use std::path::Path;
use tracing::{debug, info, warn};

/// Counts from reinstalling extensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionReport {
    pub installed: usize,
    pub failed: usize,
}

/// Copy the snapshot's configuration into `destination`
///
/// Returns `None` when the snapshot holds no configuration.
pub fn restore_configuration(
    snapshot: &InstallationSnapshot,
    destination: &Path,
) -> Result<Option<CopyStats>> {
    let Some(source) = snapshot.config_dir() else {
        debug!("Snapshot has no configuration to restore");
        return Ok(None);
    };

    info!("Restoring configuration to {}", destination.display());
    let stats = copy_tree(source, destination, FailurePolicy::BestEffort)?;
    if stats.failed > 0 {
        warn!("{} configuration files could not be restored", stats.failed);
    }
    Ok(Some(stats))
}

/// Reinstall every extension in the snapshot, in order
///
/// Individual failures don't fail the step.
pub fn reinstall_extensions(
    snapshot: &InstallationSnapshot,
    config: &MigrationConfig,
    runner: &mut dyn CommandRunner,
) -> Result<ExtensionReport> {
    let mut report = ExtensionReport::default();
    let ids = snapshot.extension_ids();
    if ids.is_empty() {
        debug!("No extensions to reinstall");
        return Ok(report);
    }

    let Some(binary) = runner.resolve(&config.binary) else {
        warn!("'{}' not found on PATH; skipping {} extensions", config.binary, ids.len());
        report.failed = ids.len();
        return Ok(report);
    };

    info!("Reinstalling {} extensions", ids.len());
    for id in ids {
        let spec = CommandSpec::new(binary.to_string_lossy())
            .args(["--install-extension", id.as_str(), "--force"]);
        match runner.run_checked(&spec) {
            Ok(_) => {
                debug!("Installed extension {}", id);
                report.installed += 1;
            }
            Err(e) => {
                warn!("Failed to install extension {}: {}", id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::capture_snapshot;
    use crate::runner::ScriptedRunner;
    use chrono::Local;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot_with(
        temp: &TempDir,
        extensions: &str,
    ) -> (MigrationConfig, InstallationSnapshot) {
        let config = MigrationConfig::rooted_at(temp.path());
        fs::create_dir_all(config.paths.config_dir.join("snippets")).unwrap();
        fs::write(config.paths.config_dir.join("settings.json"), "{\"a\":1}").unwrap();
        fs::write(config.paths.config_dir.join("snippets/go.json"), "{}").unwrap();

        let mut runner = ScriptedRunner::new()
            .with_binary("code", "/snap/bin/code")
            .reply("--list-extensions", 0, extensions);
        let snapshot = capture_snapshot(
            &config,
            &config.paths.config_dir,
            &config.paths.extensions_dir,
            &mut runner,
            Local::now(),
        )
        .unwrap();
        (config, snapshot)
    }

    #[test]
    fn test_restore_continues_past_failed_file() {
        let temp = TempDir::new().unwrap();
        let (config, snapshot) = snapshot_with(&temp, "");
        fs::write(snapshot.config_dir().unwrap().join("keybindings.json"), "[]").unwrap();

        let dest = temp.path().join("restored");
        fs::create_dir_all(dest.join("settings.json")).unwrap();

        let stats = restore_configuration(&snapshot, &dest).unwrap().unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.files, 2);
        assert_eq!(fs::read_to_string(dest.join("keybindings.json")).unwrap(), "[]");
        assert!(dest.join("snippets/go.json").exists());
        assert!(config.paths.config_dir.join("settings.json").is_file());
    }

    #[test]
    fn test_restore_noop_without_config() {
        let temp = TempDir::new().unwrap();
        let snapshot = InstallationSnapshot::empty(temp.path().join("backup"), Local::now());
        let dest = temp.path().join("dest");
        assert_eq!(restore_configuration(&snapshot, &dest).unwrap(), None);
        assert!(!dest.exists());
    }

    #[test]
    fn test_restore_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let (_, snapshot) = snapshot_with(&temp, "");
        let dest = temp.path().join("fresh/User");

        restore_configuration(&snapshot, &dest).unwrap();
        let first = fs::read_to_string(dest.join("settings.json")).unwrap();
        let stats = restore_configuration(&snapshot, &dest).unwrap().unwrap();
        let second = fs::read_to_string(dest.join("settings.json")).unwrap();

        assert_eq!(first, second);
        assert_eq!(stats.files, 2);
        assert!(dest.join("snippets/go.json").exists());
    }

    #[test]
    fn test_partial_extension_failure() {
        let temp = TempDir::new().unwrap();
        let (config, snapshot) = snapshot_with(&temp, "x.ext1\nx.ext2\n");

        let mut runner = ScriptedRunner::new()
            .with_binary("code", "/usr/bin/code")
            .reply("--install-extension x.ext1", 1, "");
        let report = reinstall_extensions(&snapshot, &config, &mut runner).unwrap();

        assert_eq!(report, ExtensionReport { installed: 1, failed: 1 });
        assert_eq!(
            runner.command_lines(),
            vec![
                "/usr/bin/code --install-extension x.ext1 --force",
                "/usr/bin/code --install-extension x.ext2 --force",
            ]
        );
        assert_eq!(snapshot.extension_ids(), ["x.ext1", "x.ext2"]);
    }

    #[test]
    fn test_no_extensions_is_noop() {
        let config = MigrationConfig::default();
        let snapshot = InstallationSnapshot::empty("/tmp/none".into(), Local::now());
        let mut runner = ScriptedRunner::new();
        let report = reinstall_extensions(&snapshot, &config, &mut runner).unwrap();
        assert_eq!(report, ExtensionReport::default());
        assert!(runner.history().is_empty());
    }
}
