// src/workflow.rs

//! The migration workflow
//!
//! Steps run strictly in order and each one blocks until it is done:
//!
//! ```text
//! Start -> Detect -> Snapshot -> Remove -> Install -> Restore
//!       -> ReinstallExtensions -> ApplyOverlay -> Verify -> Report
//! ```
//!
//! The first fatal error moves the workflow to `Aborted` and is returned as
//! a [`MigrationError`] naming the step that failed. There is no rollback:
//! whatever the completed steps did stays done. Recoverable problems are
//! logged as warnings and the workflow moves on.

use crate::config::MigrationConfig;
use crate::error::Error;
use crate::filesystem::CopyStats;
use crate::install::{
    detect_installation, install_from_vendor_source, remove_prior_installation, Downloader,
    InstallationKind,
};
use crate::overlay::{apply_config_overlay, ConfigOverlay, OverlayOutcome};
use crate::prompt::Prompter;
use crate::restore::{reinstall_extensions, restore_configuration, ExtensionReport};
use crate::runner::{CommandRunner, CommandSpec};
use crate::shell::{write_shell_integration, IntegrationFiles, ShellKind};
use crate::snapshot::{backup_stamp, capture_snapshot, InstallationSnapshot};
use crate::verify::{verify_installation, InstallationStatus};
use chrono::{DateTime, Local};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Workflow phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Start,
    Detect,
    Snapshot,
    Remove,
    Install,
    Restore,
    ReinstallExtensions,
    ApplyOverlay,
    Verify,
    Report,
    Aborted,
}

impl MigrationState {
    /// Phase that follows this one; terminal phases have none
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Detect),
            Self::Detect => Some(Self::Snapshot),
            Self::Snapshot => Some(Self::Remove),
            Self::Remove => Some(Self::Install),
            Self::Install => Some(Self::Restore),
            Self::Restore => Some(Self::ReinstallExtensions),
            Self::ReinstallExtensions => Some(Self::ApplyOverlay),
            Self::ApplyOverlay => Some(Self::Verify),
            Self::Verify => Some(Self::Report),
            Self::Report | Self::Aborted => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Detect => "detect installation",
            Self::Snapshot => "back up configuration",
            Self::Remove => "remove old installation",
            Self::Install => "install from vendor repository",
            Self::Restore => "restore configuration",
            Self::ReinstallExtensions => "reinstall extensions",
            Self::ApplyOverlay => "apply settings overlay",
            Self::Verify => "verify installation",
            Self::Report => "report",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fatal failure and the step it happened in
#[derive(Error, Debug)]
#[error("Migration aborted during '{state}': {source}")]
pub struct MigrationError {
    pub state: MigrationState,
    #[source]
    pub source: Error,
}

/// Everything a completed migration did
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub detected: InstallationKind,
    pub snapshot: InstallationSnapshot,
    /// `None` when there was no configuration to restore
    pub restored: Option<CopyStats>,
    pub extensions: ExtensionReport,
    pub overlay: OverlayOutcome,
    /// `None` when no supported shell was found
    pub shell_files: Option<IntegrationFiles>,
    pub status: InstallationStatus,
    pub launched: bool,
}

/// How a run ended without a fatal error
#[derive(Debug, Clone)]
pub enum MigrationOutcome {
    Completed(Box<MigrationReport>),
    /// The user chose not to reinstall an existing installation
    Declined(InstallationKind),
}

/// One migration run over explicit collaborators
pub struct Workflow<'a> {
    config: &'a MigrationConfig,
    runner: &'a mut dyn CommandRunner,
    downloader: &'a dyn Downloader,
    prompter: &'a mut dyn Prompter,
    started_at: DateTime<Local>,
    state: MigrationState,
}

impl<'a> Workflow<'a> {
    pub fn new(
        config: &'a MigrationConfig,
        runner: &'a mut dyn CommandRunner,
        downloader: &'a dyn Downloader,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            config,
            runner,
            downloader,
            prompter,
            started_at: Local::now(),
            state: MigrationState::Start,
        }
    }

    /// Pin the run timestamp used for backup names
    pub fn with_start_time(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            debug!("Workflow: {} -> {}", self.state, next);
            self.state = next;
            info!("==> {}", next);
        }
    }

    fn abort(&mut self, source: Error) -> MigrationError {
        let state = self.state;
        self.state = MigrationState::Aborted;
        MigrationError { state, source }
    }

    /// Run every step in order
    pub fn run(&mut self) -> Result<MigrationOutcome, MigrationError> {
        let config = self.config;
        let stamp = backup_stamp(&self.started_at);

        self.advance();
        let detected = detect_installation(config, self.runner);
        info!("Current installation: {}", detected);
        if detected.is_installed() {
            let question = format!(
                "{} is already installed ({}). Reinstall from the vendor repository?",
                config.binary, detected
            );
            // Removal is destructive; without an explicit yes nothing happens
            let proceed = self.prompter.confirm(&question, false).map_err(|e| self.abort(e))?;
            if !proceed {
                info!("Migration declined");
                self.state = MigrationState::Report;
                return Ok(MigrationOutcome::Declined(detected));
            }
        }

        self.advance();
        let snapshot = capture_snapshot(
            config,
            &config.paths.config_dir,
            &config.paths.extensions_dir,
            self.runner,
            self.started_at,
        )
        .map_err(|e| self.abort(e))?;

        self.advance();
        remove_prior_installation(detected, config, self.runner).map_err(|e| self.abort(e))?;

        self.advance();
        install_from_vendor_source(config, self.runner, self.downloader)
            .map_err(|e| self.abort(e))?;

        self.advance();
        let restored =
            restore_configuration(&snapshot, &config.paths.config_dir).map_err(|e| self.abort(e))?;

        self.advance();
        let extensions =
            reinstall_extensions(&snapshot, config, self.runner).map_err(|e| self.abort(e))?;
        if extensions.failed > 0 {
            warn!(
                "{} of {} extensions failed to reinstall",
                extensions.failed,
                snapshot.extension_ids().len()
            );
        }

        self.advance();
        let shell = config.target_shell();
        let overlay = ConfigOverlay::from_config(config, shell);
        let merger = config.overlay.strategy.merger();
        let overlay = apply_config_overlay(&overlay, &config.paths.settings_file(), &*merger, &stamp)
            .map_err(|e| self.abort(e))?;
        let shell_files = self.configure_shell(shell);

        self.advance();
        let status = verify_installation(config, self.runner).map_err(|e| self.abort(e))?;

        self.advance();
        let launched = self.offer_launch(&status).map_err(|e| self.abort(e))?;

        Ok(MigrationOutcome::Completed(Box::new(MigrationReport {
            detected,
            snapshot,
            restored,
            extensions,
            overlay,
            shell_files,
            status,
            launched,
        })))
    }

    /// Shell integration is best-effort
    fn configure_shell(&mut self, shell: Option<ShellKind>) -> Option<IntegrationFiles> {
        let Some(shell) = shell else {
            warn!("No supported shell detected; skipping shell integration");
            return None;
        };
        let Some(binary) = self.runner.resolve(&self.config.binary) else {
            warn!("'{}' not found on PATH; skipping shell integration", self.config.binary);
            return None;
        };
        match write_shell_integration(self.config, shell, &binary) {
            Ok(files) => Some(files),
            Err(e) => {
                warn!("Shell integration failed: {}", e);
                None
            }
        }
    }

    fn offer_launch(&mut self, status: &InstallationStatus) -> crate::Result<bool> {
        if !self.prompter.confirm("Launch the editor now?", false)? {
            return Ok(false);
        }
        let spec = CommandSpec::new(status.resolved_path.to_string_lossy());
        match self.runner.spawn_detached(&spec) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Could not launch editor: {}", e);
                Ok(false)
            }
        }
    }
}
