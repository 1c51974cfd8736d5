// src/commands/migrate.rs

//! The migration command
//!
//! Wires the real process runner, HTTP downloader, and terminal prompter into
//! the workflow and prints what it did.

use anyhow::Result;
use codeshift::config::MigrationConfig;
use codeshift::install::HttpDownloader;
use codeshift::prompt::TerminalPrompter;
use codeshift::runner::SystemRunner;
use codeshift::workflow::{MigrationOutcome, MigrationReport, Workflow};
use tracing::{error, info};

/// Run the full migration
pub fn cmd_migrate(config: &MigrationConfig) -> Result<()> {
    let mut runner = SystemRunner::new();
    let downloader = HttpDownloader::new()?;
    let mut prompter = TerminalPrompter::detect();

    let outcome = Workflow::new(config, &mut runner, &downloader, &mut prompter).run();
    match outcome {
        Ok(MigrationOutcome::Completed(report)) => {
            print_report(config, &report);
            Ok(())
        }
        Ok(MigrationOutcome::Declined(kind)) => {
            println!("Keeping the existing {} installation. Nothing changed.", kind);
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            println!("Migration stopped at step '{}'.", e.state);
            println!(
                "Completed steps are not rolled back; backups stay under {}.",
                config.paths.backup_parent.display()
            );
            Err(e.into())
        }
    }
}

fn print_report(config: &MigrationConfig, report: &MigrationReport) {
    info!("Migration complete");
    println!();
    println!("Migration complete");
    println!("  Previous installation: {}", report.detected);

    if report.snapshot.is_empty() {
        println!("  Backup: nothing to back up");
    } else {
        println!("  Backup: {}", report.snapshot.backup_root().display());
    }

    match &report.restored {
        Some(stats) if stats.failed > 0 => println!(
            "  Configuration restored: {} files, {} failed",
            stats.files, stats.failed
        ),
        Some(stats) => println!("  Configuration restored: {} files", stats.files),
        None => println!("  Configuration restored: none"),
    }

    let ext = &report.extensions;
    if ext.installed + ext.failed > 0 {
        println!("  Extensions: {} installed, {} failed", ext.installed, ext.failed);
    }

    let settings = config.paths.settings_file();
    if report.overlay.created {
        println!("  Settings: created {}", settings.display());
    } else {
        println!("  Settings: updated {}", settings.display());
        if let Some(backup) = &report.overlay.backup {
            println!("    previous version: {}", backup.display());
        }
    }

    if let Some(files) = &report.shell_files {
        println!("  Shell integration ({}):", files.shell);
        for line in files.source_lines() {
            println!("    {}", line);
        }
    }

    let status = &report.status;
    println!(
        "  Installed: {} {} at {}",
        config.binary,
        status.version,
        status.resolved_path.display()
    );
    if status.is_packaged_format {
        println!("  Your shell still resolves the old snap path; run `hash -r` or open a new terminal.");
    }
}
