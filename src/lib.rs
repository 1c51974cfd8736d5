// src/lib.rs

//! codeshift: move the editor from the snap package to the vendor repository
//!
//! The migration snapshots the user's configuration and extensions, swaps the
//! installation, restores what was saved, and layers a set of terminal
//! settings on top of the editor's settings file.
//!
//! # Architecture
//!
//! - Workflow: a strictly ordered state machine in [`workflow`]
//! - Side effects behind traits: [`runner::CommandRunner`],
//!   [`install::Downloader`], [`prompt::Prompter`], [`overlay::JsonMerger`]
//! - Errors: the library returns [`Error`]; the CLI wraps them with `anyhow`

pub mod audit;
pub mod config;
mod error;
pub mod filesystem;
pub mod install;
pub mod overlay;
pub mod prompt;
pub mod restore;
pub mod runner;
pub mod shell;
pub mod snapshot;
pub mod verify;
pub mod workflow;

pub use config::MigrationConfig;
pub use error::{Error, Result};
pub use install::InstallationKind;
pub use workflow::{MigrationError, MigrationOutcome, MigrationReport, MigrationState, Workflow};
