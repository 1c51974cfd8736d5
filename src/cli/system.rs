// src/cli/system.rs
//! Housekeeping commands: completions, config

use clap::Subcommand;
use clap_complete::Shell;

#[derive(Subcommand)]
pub enum SystemArgs {
    /// Generate shell completions for codeshift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the effective configuration as TOML
    Config,
}
