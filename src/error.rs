// src/error.rs

//! Error types for the migration workflow

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a migration step
#[derive(Error, Debug)]
pub enum Error {
    /// An external command ran but exited unsuccessfully
    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// An external command could not be started at all
    #[error("Failed to run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the terminal failed
    #[error("Terminal I/O error: {0}")]
    Terminal(#[source] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Existing settings file is not a JSON object
    #[error("Settings file {} is not a valid JSON object: {reason}", path.display())]
    MalformedSettings { path: PathBuf, reason: String },

    /// Fetching the vendor signing key failed
    #[error("Download failed: {0}")]
    Download(String),

    /// The editor binary could not be resolved on the search path
    #[error("'{0}' was not found on PATH")]
    BinaryNotFound(String),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit log could not be read
    #[error("Audit log error: {0}")]
    Audit(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type used across the library
pub type Result<T> = std::result::Result<T, Error>;
