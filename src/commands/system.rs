// src/commands/system.rs

use crate::cli::Cli;
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;
use codeshift::config::MigrationConfig;
use std::io;

/// Write a completion script for codeshift to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "codeshift", &mut io::stdout());
    Ok(())
}

/// Print the configuration in effect, defaults included
pub fn cmd_config(config: &MigrationConfig) -> Result<()> {
    println!("# {}", MigrationConfig::default_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
