// src/install/detect.rs

//! Detection of the editor's current installation kind

use crate::config::MigrationConfig;
use crate::runner::{CommandRunner, CommandSpec};
use std::fmt;
use std::path::{Component, Path};
use tracing::debug;

/// Path component marking a packaged-format (snap) location
const PACKAGED_MARKER: &str = "snap";

/// How the editor is currently installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationKind {
    NotInstalled,
    /// Self-contained sandboxed distribution (snap)
    Packaged,
    /// Native package from the system package manager
    Native,
}

impl InstallationKind {
    pub fn is_installed(self) -> bool {
        self != Self::NotInstalled
    }
}

impl fmt::Display for InstallationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotInstalled => "not installed",
            Self::Packaged => "packaged (snap)",
            Self::Native => "native package",
        };
        f.write_str(label)
    }
}

/// True when `path` lies under a packaged-format location such as `/snap/bin`
pub fn is_packaged_path(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == PACKAGED_MARKER))
}

/// Detect how the editor is installed
///
/// Never fails: tools that cannot be run simply don't report an install.
pub fn detect_installation(
    config: &MigrationConfig,
    runner: &mut dyn CommandRunner,
) -> InstallationKind {
    let snap_query = CommandSpec::new("snap").args(["list", config.snap_name.as_str()]);
    match runner.run(&snap_query) {
        Ok(output) if output.success() => {
            debug!("snap reports {} installed", config.snap_name);
            return InstallationKind::Packaged;
        }
        Ok(_) => debug!("snap does not list {}", config.snap_name),
        Err(e) => debug!("snap unavailable: {}", e),
    }

    match runner.resolve(&config.binary) {
        Some(path) if is_packaged_path(&path) => InstallationKind::Packaged,
        Some(path) => {
            debug!("{} resolves to {}", config.binary, path.display());
            InstallationKind::Native
        }
        None => InstallationKind::NotInstalled,
    }
}
