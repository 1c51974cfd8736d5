// src/commands/shell.rs

use anyhow::{Context, Result};
use codeshift::config::MigrationConfig;
use codeshift::runner::{CommandRunner, SystemRunner};
use codeshift::shell::{write_shell_integration, ShellKind};

/// Regenerate the launcher function and completions without migrating
pub fn cmd_shell_integration(config: &MigrationConfig, shell: Option<ShellKind>) -> Result<()> {
    let shell = shell
        .or_else(|| config.target_shell())
        .context("Could not detect a supported shell from $SHELL; pass --shell")?;

    let runner = SystemRunner::new();
    let binary = runner
        .resolve(&config.binary)
        .with_context(|| format!("'{}' not found on PATH; install the editor first", config.binary))?;

    let files = write_shell_integration(config, shell, &binary)?;
    println!("Wrote {} integration:", shell);
    println!("  {}", files.function.display());
    println!("  {}", files.completion.display());

    let lines = files.source_lines();
    if !lines.is_empty() {
        println!("Add to your shell startup file:");
        for line in lines {
            println!("  {}", line);
        }
    }
    Ok(())
}
