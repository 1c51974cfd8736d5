// src/cli/mod.rs
//! CLI definitions for codeshift
//!
//! Running `codeshift` with no subcommand performs the migration. The other
//! commands are maintenance helpers:
//! - `shell-integration` - Regenerate the editor launcher and completions
//! - `audit` - Show recent chat CLI audit sessions
//! - `completions` - Completion scripts for codeshift itself
//! - `config` - Print the effective configuration

use clap::{Parser, Subcommand};
use codeshift::shell::ShellKind;
use std::path::PathBuf;

mod system;

pub use system::SystemArgs;

#[derive(Parser)]
#[command(name = "codeshift")]
#[command(version)]
#[command(about = "Move the editor from the snap package to the vendor apt repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full migration (the default)
    Migrate,

    /// Write the editor launcher function and completions for a shell
    ShellIntegration {
        /// Shell to target (default: configured shell, then $SHELL)
        #[arg(short, long, value_enum)]
        shell: Option<ShellKind>,
    },

    /// Summarize recent chat CLI audit sessions
    Audit {
        /// Audit directory (default: auto-detected)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Number of sessions to show, newest first
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    #[command(flatten)]
    System(SystemArgs),
}
