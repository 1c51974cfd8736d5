// src/commands/audit.rs

//! Audit command - print recent chat CLI sessions

use anyhow::Result;
use codeshift::audit::{list_session_files, load_session, locate_audit_directory, SessionSummary};
use codeshift::config::MigrationConfig;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Show the newest `limit` sessions
pub fn cmd_audit(config: &MigrationConfig, dir: Option<PathBuf>, limit: usize) -> Result<()> {
    let Some(dir) = dir.or_else(|| locate_audit_directory(&config.audit.app_dir)) else {
        println!("No audit directory found");
        return Ok(());
    };
    println!("Audit directory: {}", dir.display());

    let files = list_session_files(&dir)?;
    if files.is_empty() {
        println!("No session files found");
        return Ok(());
    }
    println!("Found {} session files", files.len());

    for file in files.iter().take(limit) {
        let events = match load_session(file) {
            Ok(events) => events,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        match SessionSummary::from_events(file, &events) {
            Some(summary) => println!("\n{}", summary),
            None => debug!("{} has no events", file.display()),
        }
    }
    Ok(())
}
