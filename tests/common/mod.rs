// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use codeshift::config::MigrationConfig;
use codeshift::install::StaticDownloader;
use codeshift::runner::ScriptedRunner;
use codeshift::shell::ShellKind;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const KEY_URL: &str = "https://packages.microsoft.com/keys/microsoft.asc";

pub const ARMORED_KEY: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----
Version: test

mQENBFsx
=abcd
-----END PGP PUBLIC KEY BLOCK-----
";

pub const ORIGINAL_SETTINGS: &str = r#"{
    "editor.fontSize": 14,
    "terminal.integrated.inheritEnv": false
}
"#;

/// A throwaway home directory and a configuration rooted in it.
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the directory.
pub struct TestHome {
    pub temp: TempDir,
    pub config: MigrationConfig,
}

impl TestHome {
    /// Empty home, fish as the target shell
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let mut config = MigrationConfig::rooted_at(temp.path());
        config.shell.shell = Some(ShellKind::Fish);
        Self { temp, config }
    }

    /// Home of a user who ran the snap build for a while
    pub fn with_snap_user_data() -> Self {
        let home = Self::new();
        let paths = &home.config.paths;

        fs::create_dir_all(paths.config_dir.join("snippets")).unwrap();
        fs::write(paths.settings_file(), ORIGINAL_SETTINGS).unwrap();
        fs::write(paths.config_dir.join("keybindings.json"), "[]\n").unwrap();
        fs::write(paths.config_dir.join("snippets/rust.json"), "{}\n").unwrap();

        let ext = paths.extensions_dir.join("x.ext2-1.0.0");
        fs::create_dir_all(&ext).unwrap();
        fs::write(ext.join("package.json"), r#"{"name":"ext2"}"#).unwrap();

        home
    }

    pub fn backup_dirs(&self) -> Vec<PathBuf> {
        let prefix = &self.config.paths.backup_prefix;
        let mut dirs: Vec<PathBuf> = fs::read_dir(self.temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(prefix.as_str()))
            })
            .collect();
        dirs.sort();
        dirs
    }
}

/// Downloader serving the vendor key
pub fn key_downloader() -> StaticDownloader {
    StaticDownloader::new().with(KEY_URL, ARMORED_KEY)
}

/// Snap installation with two extensions; `x.ext1` fails to reinstall
pub fn snap_machine() -> ScriptedRunner {
    ScriptedRunner::new()
        .with_binary("code", "/snap/bin/code")
        .reply("snap list", 0, "Name  Version\ncode  1.85.1\n")
        .reply("--list-extensions", 0, "x.ext1\nx.ext2\n")
        .reply("--install-extension x.ext1", 1, "")
        .reply("--version", 0, "1.92.0\n")
        .removes("snap remove code", "code")
        .installs("apt-get install -y code", "code", "/usr/bin/code")
}
