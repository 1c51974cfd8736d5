// src/verify.rs

//! Post-install verification

use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use crate::install::is_packaged_path;
use crate::runner::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use tracing::{info, warn};

/// Identity and location of the installed editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationStatus {
    pub found: bool,
    pub version: String,
    pub resolved_path: PathBuf,
    /// Still resolving to the packaged location; the shell's command cache
    /// needs refreshing
    pub is_packaged_format: bool,
}

/// Resolve the editor binary and read its version
///
/// An unresolvable binary is fatal. A packaged-format path is only a warning.
pub fn verify_installation(
    config: &MigrationConfig,
    runner: &mut dyn CommandRunner,
) -> Result<InstallationStatus> {
    let resolved_path = runner
        .resolve(&config.binary)
        .ok_or_else(|| Error::BinaryNotFound(config.binary.clone()))?;

    let spec = CommandSpec::new(resolved_path.to_string_lossy()).arg("--version");
    let version = match runner.run(&spec) {
        Ok(output) if output.success() => output
            .stdout
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .unwrap_or_default(),
        Ok(output) => {
            warn!("{} exited unsuccessfully: {}", spec, output.stderr.trim());
            String::new()
        }
        Err(e) => {
            warn!("Could not query version: {}", e);
            String::new()
        }
    };

    let is_packaged_format = is_packaged_path(&resolved_path);
    if is_packaged_format {
        warn!(
            "{} still resolves to {}; run `hash -r` or open a new shell",
            config.binary,
            resolved_path.display()
        );
    } else {
        info!("{} {} at {}", config.binary, version, resolved_path.display());
    }

    Ok(InstallationStatus {
        found: true,
        version,
        resolved_path,
        is_packaged_format,
    })
}
