// src/commands/mod.rs
//! Command handlers for the codeshift CLI

mod audit;
mod migrate;
mod shell;
mod system;

pub use audit::cmd_audit;
pub use migrate::cmd_migrate;
pub use shell::cmd_shell_integration;
pub use system::{cmd_completions, cmd_config};
