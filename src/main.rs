// src/main.rs

use anyhow::Result;
use clap::Parser;
use codeshift::config::MigrationConfig;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Commands, SystemArgs};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Completions don't need configuration
    if let Some(Commands::System(SystemArgs::Completions { shell })) = &cli.command {
        return commands::cmd_completions(*shell);
    }

    let config = MigrationConfig::load()?;
    debug!("Loaded configuration from {}", MigrationConfig::default_path().display());

    match cli.command {
        None | Some(Commands::Migrate) => commands::cmd_migrate(&config),
        Some(Commands::ShellIntegration { shell }) => commands::cmd_shell_integration(&config, shell),
        Some(Commands::Audit { dir, limit }) => commands::cmd_audit(&config, dir, limit),
        Some(Commands::System(SystemArgs::Completions { shell })) => commands::cmd_completions(shell),
        Some(Commands::System(SystemArgs::Config)) => commands::cmd_config(&config),
    }
}
