// src/overlay.rs

//! Forcing settings into the editor's JSON settings file
//!
//! The overlay is merged on top of whatever the settings file already holds.
//! How the two are combined is a [`JsonMerger`]:
//!
//! - [`ShallowMerge`]: top-level overlay keys replace existing keys; nested
//!   objects are replaced wholesale (the default)
//! - [`DeepMerge`]: nested objects are merged key by key
//! - [`OverwriteMerge`]: no merging at all, the overlay becomes the file
//!
//! An existing file is always backed up before it is rewritten.

use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use crate::shell::ShellKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Settings key selecting the integrated terminal's default shell
pub const DEFAULT_PROFILE_KEY: &str = "terminal.integrated.defaultProfile.linux";

/// A JSON object of settings
pub type Settings = Map<String, Value>;

/// Merge strategy selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    #[default]
    Shallow,
    Deep,
    Overwrite,
}

impl MergeStrategy {
    pub fn merger(self) -> Box<dyn JsonMerger> {
        match self {
            Self::Shallow => Box::new(ShallowMerge),
            Self::Deep => Box::new(DeepMerge),
            Self::Overwrite => Box::new(OverwriteMerge),
        }
    }
}

/// Combines existing settings with an overlay
pub trait JsonMerger {
    fn merge(&self, base: Settings, overlay: &Settings) -> Settings;

    /// Whether the existing file is read at all. A merger that doesn't read
    /// it replaces the file with the overlay.
    fn reads_base(&self) -> bool {
        true
    }
}

/// Top-level key union, overlay wins
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl JsonMerger for ShallowMerge {
    fn merge(&self, mut base: Settings, overlay: &Settings) -> Settings {
        for (key, value) in overlay {
            base.insert(key.clone(), value.clone());
        }
        base
    }
}

/// Recursive union of nested objects, overlay wins on leaves
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepMerge;

impl JsonMerger for DeepMerge {
    fn merge(&self, mut base: Settings, overlay: &Settings) -> Settings {
        for (key, value) in overlay {
            match (base.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    let current = std::mem::take(existing);
                    *existing = self.merge(current, incoming);
                }
                _ => {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        base
    }
}

/// No merge capability: the overlay replaces the file
#[derive(Debug, Clone, Copy, Default)]
pub struct OverwriteMerge;

impl JsonMerger for OverwriteMerge {
    fn merge(&self, _base: Settings, overlay: &Settings) -> Settings {
        overlay.clone()
    }

    fn reads_base(&self) -> bool {
        false
    }
}

/// Settings to force into the destination file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverlay {
    settings: Settings,
}

impl ConfigOverlay {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Overlay from configuration, pointing the integrated terminal at
    /// `shell` unless the configuration already chooses a profile
    pub fn from_config(config: &MigrationConfig, shell: Option<ShellKind>) -> Self {
        let mut settings = config.overlay.settings.clone();
        if let Some(shell) = shell
            && !settings.contains_key(DEFAULT_PROFILE_KEY)
        {
            settings.insert(
                DEFAULT_PROFILE_KEY.to_string(),
                Value::String(shell.name().to_string()),
            );
        }
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// What applying an overlay did
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutcome {
    /// Settings now on disk
    pub result: Settings,
    /// Backup of the previous file, if there was one
    pub backup: Option<PathBuf>,
    /// The file did not exist before
    pub created: bool,
}

/// Backup location for `settings_file` tagged with `stamp`
pub fn backup_path(settings_file: &Path, stamp: &str) -> PathBuf {
    let mut name = settings_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".codeshift-{}.bak", stamp));
    settings_file.with_file_name(name)
}

/// Merge `overlay` into `settings_file` and write the result back
///
/// A missing file is created from the overlay alone. An existing file is
/// first copied to [`backup_path`]; a backup that already exists for this
/// `stamp` is left untouched, so repeated runs keep the original.
pub fn apply_config_overlay(
    overlay: &ConfigOverlay,
    settings_file: &Path,
    merger: &dyn JsonMerger,
    stamp: &str,
) -> Result<OverlayOutcome> {
    if !settings_file.exists() {
        info!("Creating {}", settings_file.display());
        write_settings(settings_file, overlay.settings())?;
        return Ok(OverlayOutcome {
            result: overlay.settings().clone(),
            backup: None,
            created: true,
        });
    }

    let base = if merger.reads_base() {
        read_settings(settings_file)?
    } else {
        warn!(
            "Settings merge unavailable; replacing {} with overlay",
            settings_file.display()
        );
        Settings::new()
    };

    let backup = backup_path(settings_file, stamp);
    if backup.exists() {
        debug!("Keeping existing backup {}", backup.display());
    } else {
        fs::copy(settings_file, &backup).map_err(|e| Error::io(&backup, e))?;
        info!("Backed up settings to {}", backup.display());
    }

    let result = merger.merge(base, overlay.settings());
    write_settings(settings_file, &result)?;
    info!("Applied {} overlay settings", overlay.settings().len());

    Ok(OverlayOutcome {
        result,
        backup: Some(backup),
        created: false,
    })
}

/// Read a settings file that must hold a JSON object
///
/// A blank file counts as an empty object.
pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(Settings::new());
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::MalformedSettings {
            path: path.to_path_buf(),
            reason: format!("expected an object, found {}", json_kind(&other)),
        }),
        Err(e) => Err(Error::MalformedSettings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Write settings with four-space indentation, replacing the file atomically
pub fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    settings.serialize(&mut serializer)?;
    buffer.push(b'\n');

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    staged.write_all(&buffer).map_err(|e| Error::io(staged.path(), e))?;
    staged
        .persist(path)
        .map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn settings(value: Value) -> Settings {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_shallow_merge_overlay_wins() {
        let merged = ShallowMerge.merge(
            settings(json!({"a": 1, "b": 2})),
            &settings(json!({"b": 3, "c": 4})),
        );
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_shallow_merge_replaces_nested_objects() {
        let merged = ShallowMerge.merge(
            settings(json!({"files.exclude": {"**/.git": true, "**/target": true}})),
            &settings(json!({"files.exclude": {"**/node_modules": true}})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"files.exclude": {"**/node_modules": true}})
        );
    }

    #[test]
    fn test_deep_merge_recurses() {
        let merged = DeepMerge.merge(
            settings(json!({"files.exclude": {"**/.git": true}, "x": 1})),
            &settings(json!({"files.exclude": {"**/target": true}, "x": {"y": 2}})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"files.exclude": {"**/.git": true, "**/target": true}, "x": {"y": 2}})
        );
    }

    #[test]
    fn test_apply_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("User/settings.json");
        let overlay = ConfigOverlay::new(settings(json!({"c": 4})));

        let outcome = apply_config_overlay(&overlay, &file, &ShallowMerge, "stamp").unwrap();

        assert!(outcome.created);
        assert!(outcome.backup.is_none());
        assert_eq!(read_settings(&file).unwrap(), settings(json!({"c": 4})));
    }

    #[test]
    fn test_apply_preserves_unrelated_keys() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, r#"{"a":1,"b":2}"#).unwrap();
        let overlay = ConfigOverlay::new(settings(json!({"b": 3, "c": 4})));

        let outcome = apply_config_overlay(&overlay, &file, &ShallowMerge, "s1").unwrap();

        assert_eq!(Value::Object(outcome.result), json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(
            Value::Object(read_settings(&file).unwrap()),
            json!({"a": 1, "b": 3, "c": 4})
        );
        let backup = outcome.backup.unwrap();
        assert_eq!(backup, temp.path().join("settings.json.codeshift-s1.bak"));
        assert_eq!(fs::read_to_string(backup).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_apply_twice_is_idempotent_and_keeps_first_backup() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, r#"{"a":1}"#).unwrap();
        let overlay = ConfigOverlay::new(settings(json!({"b": {"nested": true}})));

        apply_config_overlay(&overlay, &file, &ShallowMerge, "run").unwrap();
        let once = fs::read_to_string(&file).unwrap();
        let outcome = apply_config_overlay(&overlay, &file, &ShallowMerge, "run").unwrap();
        let twice = fs::read_to_string(&file).unwrap();

        assert_eq!(once, twice);
        assert_eq!(fs::read_to_string(outcome.backup.unwrap()).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_malformed_settings_is_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, "{ \"a\": 1, // comment\n}").unwrap();
        let overlay = ConfigOverlay::new(settings(json!({"b": 1})));

        let result = apply_config_overlay(&overlay, &file, &ShallowMerge, "s");
        assert!(matches!(result, Err(Error::MalformedSettings { .. })));
        assert_eq!(fs::read_to_string(&file).unwrap(), "{ \"a\": 1, // comment\n}");
    }

    #[test]
    fn test_non_object_settings_is_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, "[1, 2]").unwrap();
        let err = read_settings(&file).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_overwrite_fallback_keeps_backup() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, "not json at all").unwrap();
        let overlay = ConfigOverlay::new(settings(json!({"b": 1})));

        let outcome = apply_config_overlay(&overlay, &file, &OverwriteMerge, "s").unwrap();

        assert_eq!(Value::Object(read_settings(&file).unwrap()), json!({"b": 1}));
        assert_eq!(fs::read_to_string(outcome.backup.unwrap()).unwrap(), "not json at all");
    }

    #[test]
    fn test_blank_file_counts_as_empty() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        fs::write(&file, "\n").unwrap();
        assert!(read_settings(&file).unwrap().is_empty());
    }

    #[test]
    fn test_overlay_adds_shell_profile() {
        let config = MigrationConfig::default();
        let overlay = ConfigOverlay::from_config(&config, Some(ShellKind::Fish));
        assert_eq!(overlay.settings()[DEFAULT_PROFILE_KEY], json!("fish"));

        let mut config = MigrationConfig::default();
        config
            .overlay
            .settings
            .insert(DEFAULT_PROFILE_KEY.to_string(), json!("bash"));
        let overlay = ConfigOverlay::from_config(&config, Some(ShellKind::Zsh));
        assert_eq!(overlay.settings()[DEFAULT_PROFILE_KEY], json!("bash"));
    }

    #[test]
    fn test_written_file_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("settings.json");
        write_settings(&file, &settings(json!({"a": 1}))).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "{\n    \"a\": 1\n}\n");
    }

    #[test]
    fn test_backup_path_naming() {
        assert_eq!(
            backup_path(Path::new("/home/u/.config/Code/User/settings.json"), "20240101-000000"),
            PathBuf::from("/home/u/.config/Code/User/settings.json.codeshift-20240101-000000.bak")
        );
    }
}
