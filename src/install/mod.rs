// src/install/mod.rs

//! Removing the old installation and installing from the vendor repository
//!
//! Both steps are all-or-nothing from the workflow's point of view: any
//! failing command aborts the migration, and nothing is rolled back.

mod detect;
mod keyring;

pub use detect::{detect_installation, is_packaged_path, InstallationKind};
pub use keyring::{dearmor, Downloader, HttpDownloader};
#[cfg(any(test, feature = "testing"))]
pub use keyring::StaticDownloader;

use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Remove the detected installation
///
/// Nothing to do when the editor isn't installed.
pub fn remove_prior_installation(
    kind: InstallationKind,
    config: &MigrationConfig,
    runner: &mut dyn CommandRunner,
) -> Result<()> {
    let spec = match kind {
        InstallationKind::NotInstalled => {
            info!("No prior installation to remove");
            return Ok(());
        }
        InstallationKind::Packaged => {
            CommandSpec::new("snap").args(["remove", config.snap_name.as_str()])
        }
        InstallationKind::Native => {
            CommandSpec::new("apt-get").args(["remove", "-y", config.package.as_str()])
        }
    }
    .privileged(config.privilege());

    info!("Removing {} installation: {}", kind, spec);
    runner.run_checked(&spec)?;
    Ok(())
}

/// Register the vendor key and repository, refresh the index, install the package
pub fn install_from_vendor_source(
    config: &MigrationConfig,
    runner: &mut dyn CommandRunner,
    downloader: &dyn Downloader,
) -> Result<()> {
    let source = &config.source;
    let privilege = config.privilege();

    info!("Fetching signing key from {}", source.key_url);
    let key = dearmor(&downloader.fetch(&source.key_url)?)?;
    install_file(&key, &source.keyring_path, runner, privilege)?;

    let line = format!("{}\n", source.repository_line());
    install_file(line.as_bytes(), &source.list_path, runner, privilege)?;

    info!("Refreshing package index");
    runner.run_checked(&CommandSpec::new("apt-get").arg("update").privileged(privilege))?;

    info!("Installing {}", config.package);
    runner.run_checked(
        &CommandSpec::new("apt-get")
            .args(["install", "-y", config.package.as_str()])
            .privileged(privilege),
    )?;

    Ok(())
}

/// Stage `content` in a temp file and `install` it into a system path
fn install_file(
    content: &[u8],
    destination: &Path,
    runner: &mut dyn CommandRunner,
    privilege: Option<&str>,
) -> Result<()> {
    let mut staged = NamedTempFile::new().map_err(|e| Error::io(std::env::temp_dir(), e))?;
    staged
        .write_all(content)
        .and_then(|()| staged.flush())
        .map_err(|e| Error::io(staged.path(), e))?;

    let spec = CommandSpec::new("install")
        .args(["-D", "-m", "0644"])
        .arg(staged.path().to_string_lossy())
        .arg(destination.to_string_lossy())
        .privileged(privilege);
    runner.run_checked(&spec)?;
    info!("Installed {}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScriptedRunner;

    const KEY_URL: &str = "https://packages.microsoft.com/keys/microsoft.asc";

    #[test]
    fn test_remove_not_installed_is_noop() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new();
        remove_prior_installation(InstallationKind::NotInstalled, &config, &mut runner).unwrap();
        assert!(runner.history().is_empty());
    }

    #[test]
    fn test_remove_packaged_uses_snap() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new();
        remove_prior_installation(InstallationKind::Packaged, &config, &mut runner).unwrap();
        assert_eq!(runner.command_lines(), vec!["sudo snap remove code"]);
    }

    #[test]
    fn test_remove_native_uses_apt() {
        let mut config = MigrationConfig::default();
        config.privilege_command = String::new();
        let mut runner = ScriptedRunner::new();
        remove_prior_installation(InstallationKind::Native, &config, &mut runner).unwrap();
        assert_eq!(runner.command_lines(), vec!["apt-get remove -y code"]);
    }

    #[test]
    fn test_remove_failure_is_fatal() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new().reply("snap remove", 1, "");
        let result = remove_prior_installation(InstallationKind::Packaged, &config, &mut runner);
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }

    #[test]
    fn test_install_sequence() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new();
        let downloader = StaticDownloader::new().with(KEY_URL, vec![0x99, 0x01]);

        install_from_vendor_source(&config, &mut runner, &downloader).unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("sudo install -D -m 0644 "));
        assert!(lines[0].ends_with("/etc/apt/keyrings/packages.microsoft.gpg"));
        assert!(lines[1].ends_with("/etc/apt/sources.list.d/vscode.list"));
        assert_eq!(lines[2], "sudo apt-get update");
        assert_eq!(lines[3], "sudo apt-get install -y code");
    }

    #[test]
    fn test_install_stops_at_failed_update() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new().reply("apt-get update", 100, "");
        let downloader = StaticDownloader::new().with(KEY_URL, vec![0x99]);

        let result = install_from_vendor_source(&config, &mut runner, &downloader);
        assert!(result.is_err());
        assert!(!runner.command_lines().iter().any(|l| l.contains("apt-get install")));
    }

    #[test]
    fn test_install_key_download_failure_is_fatal() {
        let config = MigrationConfig::default();
        let mut runner = ScriptedRunner::new();
        let result = install_from_vendor_source(&config, &mut runner, &StaticDownloader::new());
        assert!(matches!(result, Err(Error::Download(_))));
        assert!(runner.history().is_empty());
    }
}
