//! `config.toml` under the data directory.
//!
//! Sections:
//! - Focus timer durations and auto-advance
//! - Strict mode, do-not-disturb and the app blocklist
//! - Commands used to probe the foreground app and toggle DND
//! - Backup export directory
//! - Log level
//!
//! Keys are addressed by dot-path (`focus.break_minutes`) from the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Focus timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Focus phase length in minutes.
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u64,
    /// Break phase length in minutes.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    /// Start the next phase automatically when one completes.
    #[serde(default = "default_true")]
    pub auto_advance: bool,
    /// Block apps on the blocklist while a focus phase runs.
    #[serde(default)]
    pub strict_mode: bool,
    /// Engage do-not-disturb while a focus phase runs.
    #[serde(default)]
    pub dnd: bool,
    /// Application identifiers blocked in strict mode.
    #[serde(default)]
    pub blocklist: Vec<String>,
    /// Shell command printing the foreground app identifier.
    #[serde(default)]
    pub foreground_command: Option<String>,
    /// Shell command run to engage do-not-disturb.
    #[serde(default)]
    pub dnd_on_command: Option<String>,
    /// Shell command run to release do-not-disturb.
    #[serde(default)]
    pub dnd_off_command: Option<String>,
    /// Shell command run when a blocked app is detected. `{app}` is substituted.
    #[serde(default)]
    pub block_command: Option<String>,
}

/// Backup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory backups are exported to. Defaults to the downloads directory.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_focus_minutes() -> u64 {
    25
}
fn default_break_minutes() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            auto_advance: true,
            strict_mode: false,
            dnd: false,
            blocklist: Vec::new(),
            foreground_command: None,
            dnd_on_command: None,
            dnd_off_command: None,
            block_command: None,
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self { export_dir: None }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus: FocusConfig::default(),
            backup: BackupConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => {
                        // Lists accept JSON or a comma-separated shorthand.
                        if value.trim_start().starts_with('[') {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        } else {
                            serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields: an empty value clears them.
                    serde_json::Value::Null | serde_json::Value::String(_)
                        if value.is_empty() =>
                    {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable file or when defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is absent.
    ///
    /// # Errors
    /// Returns an error if the file cannot be parsed or defaults cannot be saved.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Value at a dot-path, rendered as text. Strings come back unquoted.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// [`Config::load`], falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.focus.focus_minutes, 25);
        assert_eq!(cfg.focus.break_minutes, 5);
        assert!(cfg.focus.auto_advance);
        assert!(!cfg.focus.strict_mode);
        assert!(cfg.focus.blocklist.is_empty());
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[focus]\nfocus_minutes = 50\n").unwrap();
        assert_eq!(cfg.focus.focus_minutes, 50);
        assert_eq!(cfg.focus.break_minutes, 5);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("focus.focus_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("focus.strict_mode").as_deref(), Some("false"));
        assert_eq!(cfg.get("log_level").as_deref(), Some("warn"));
        assert!(cfg.get("focus.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("focus.strict_mode", "true").unwrap();
        cfg.set("focus.break_minutes", "10").unwrap();
        cfg.set("log_level", "debug").unwrap();
        assert!(cfg.focus.strict_mode);
        assert_eq!(cfg.focus.break_minutes, 10);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn set_list_accepts_comma_shorthand_and_json() {
        let mut cfg = Config::default();
        cfg.set("focus.blocklist", "com.game, com.video").unwrap();
        assert_eq!(cfg.focus.blocklist, vec!["com.game", "com.video"]);
        cfg.set("focus.blocklist", r#"["a.b"]"#).unwrap();
        assert_eq!(cfg.focus.blocklist, vec!["a.b"]);
    }

    #[test]
    fn set_optional_field_and_clear_it() {
        let mut cfg = Config::default();
        cfg.set("focus.foreground_command", "xdotool getactivewindow getwindowname")
            .unwrap();
        assert!(cfg.focus.foreground_command.is_some());
        cfg.set("focus.foreground_command", "").unwrap();
        assert!(cfg.focus.foreground_command.is_none());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("focus.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("focus.strict_mode", "not_a_bool").is_err());
        assert!(cfg.set("focus.focus_minutes", "-3").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.focus.dnd = true;
        changed.save_to(&path).unwrap();
        assert!(Config::load_from(&path).unwrap().focus.dnd);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "focus = [not toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
