// src/config.rs

//! Migration configuration
//!
//! Every path, package name, and overlay setting the workflow touches lives
//! in [`MigrationConfig`]. The configuration is loaded from an optional TOML
//! file; every field has a default, so an absent file means "migrate the
//! editor the standard way".
//!
//! ```toml
//! binary = "code"
//! package = "code"
//!
//! [paths]
//! backup_prefix = "code-backup"
//!
//! [overlay]
//! strategy = "shallow"
//!
//! [overlay.settings]
//! "terminal.integrated.shellIntegration.enabled" = true
//! ```

use crate::error::{Error, Result};
use crate::overlay::MergeStrategy;
use crate::shell::ShellKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "CODESHIFT_CONFIG";

/// Default configuration file, relative to the user config directory
pub const DEFAULT_CONFIG_FILE: &str = "codeshift/config.toml";

/// Top-level migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Editor executable name resolved on PATH
    pub binary: String,
    /// Native package name in the vendor repository
    pub package: String,
    /// Package name in the packaged (snap) format
    pub snap_name: String,
    /// Privilege escalation prefix for system commands (empty to disable)
    pub privilege_command: String,
    pub paths: PathsConfig,
    pub source: SourceConfig,
    pub overlay: OverlayConfig,
    pub shell: ShellConfig,
    pub audit: AuditConfig,
}

/// Filesystem locations used by the workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Editor user configuration directory
    pub config_dir: PathBuf,
    /// Installed extensions directory
    pub extensions_dir: PathBuf,
    /// Settings file receiving the overlay (defaults to `config_dir/settings.json`)
    pub settings_file: Option<PathBuf>,
    /// Directory that receives timestamped backup directories
    pub backup_parent: PathBuf,
    /// Name prefix of backup directories
    pub backup_prefix: String,
    /// fish configuration directory
    pub fish_dir: PathBuf,
    /// Directory for generated bash/zsh integration scripts
    pub shell_dir: PathBuf,
}

/// Vendor package source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// URL of the repository signing key
    pub key_url: String,
    /// Where the de-armored key is installed
    pub keyring_path: PathBuf,
    /// Repository definition file
    pub list_path: PathBuf,
    /// Repository base URL
    pub repo_url: String,
    pub suite: String,
    pub component: String,
    pub architectures: Vec<String>,
}

/// Settings overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// How the overlay is combined with existing settings
    pub strategy: MergeStrategy,
    /// Settings forced into the destination settings file
    pub settings: Map<String, Value>,
}

/// Shell integration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Target shell; detected from `$SHELL` when unset
    pub shell: Option<ShellKind>,
    /// Name of the generated wrapper function
    pub function_name: String,
}

/// Audit log viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Application data directory name holding `audit/`
    pub app_dir: String,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            binary: "code".to_string(),
            package: "code".to_string(),
            snap_name: "code".to_string(),
            privilege_command: "sudo".to_string(),
            paths: PathsConfig::default(),
            source: SourceConfig::default(),
            overlay: OverlayConfig::default(),
            shell: ShellConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_home = dirs::config_dir().unwrap_or_else(|| home().join(".config"));
        let data_home = dirs::data_dir().unwrap_or_else(|| home().join(".local/share"));
        Self {
            config_dir: config_home.join("Code/User"),
            extensions_dir: home().join(".vscode/extensions"),
            settings_file: None,
            backup_parent: home(),
            backup_prefix: "code-backup".to_string(),
            fish_dir: config_home.join("fish"),
            shell_dir: data_home.join("codeshift/shell"),
        }
    }
}

impl PathsConfig {
    /// Defaults laid out under an explicit home directory
    pub fn rooted_at(home: &Path) -> Self {
        Self {
            config_dir: home.join(".config/Code/User"),
            extensions_dir: home.join(".vscode/extensions"),
            settings_file: None,
            backup_parent: home.to_path_buf(),
            backup_prefix: "code-backup".to_string(),
            fish_dir: home.join(".config/fish"),
            shell_dir: home.join(".local/share/codeshift/shell"),
        }
    }

    /// Settings file receiving the overlay
    pub fn settings_file(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join("settings.json"))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            key_url: "https://packages.microsoft.com/keys/microsoft.asc".to_string(),
            keyring_path: PathBuf::from("/etc/apt/keyrings/packages.microsoft.gpg"),
            list_path: PathBuf::from("/etc/apt/sources.list.d/vscode.list"),
            repo_url: "https://packages.microsoft.com/repos/code".to_string(),
            suite: "stable".to_string(),
            component: "main".to_string(),
            architectures: vec!["amd64".to_string(), "arm64".to_string(), "armhf".to_string()],
        }
    }
}

impl SourceConfig {
    /// One-line repository definition referencing the installed keyring
    pub fn repository_line(&self) -> String {
        let mut options = Vec::new();
        if !self.architectures.is_empty() {
            options.push(format!("arch={}", self.architectures.join(",")));
        }
        options.push(format!("signed-by={}", self.keyring_path.display()));
        format!(
            "deb [{}] {} {} {}",
            options.join(" "),
            self.repo_url,
            self.suite,
            self.component
        )
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let mut settings = Map::new();
        settings.insert(
            "terminal.integrated.shellIntegration.enabled".to_string(),
            Value::Bool(true),
        );
        settings.insert(
            "terminal.integrated.shellIntegration.decorationsEnabled".to_string(),
            Value::String("both".to_string()),
        );
        settings.insert("terminal.integrated.inheritEnv".to_string(), Value::Bool(true));
        Self {
            strategy: MergeStrategy::default(),
            settings,
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: None,
            function_name: "code".to_string(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            app_dir: "amazon-q-cli".to_string(),
        }
    }
}

impl MigrationConfig {
    /// Defaults with every per-user path under `home`
    pub fn rooted_at(home: &Path) -> Self {
        Self {
            paths: PathsConfig::rooted_at(home),
            ..Self::default()
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `$CODESHIFT_CONFIG` or the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Configuration file location honoring the environment override
    pub fn default_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .unwrap_or_else(|| home().join(".config"))
                .join(DEFAULT_CONFIG_FILE),
        }
    }

    /// Privilege prefix, or `None` when disabled
    pub fn privilege(&self) -> Option<&str> {
        let cmd = self.privilege_command.trim();
        if cmd.is_empty() { None } else { Some(cmd) }
    }

    /// Shell to integrate with: configured, else detected from `$SHELL`
    pub fn target_shell(&self) -> Option<ShellKind> {
        self.shell.shell.or_else(ShellKind::from_env)
    }
}
