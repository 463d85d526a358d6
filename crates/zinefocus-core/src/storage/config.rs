//! TOML-based application configuration.
//!
//! Stores:
//! - The user whose workspace the CLI operates on
//! - Timer defaults (session length, tick cadence)
//! - Log level
//!
//! Configuration is stored at `~/.config/zinefocus/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{valid_duration, DEFAULT_DURATION_MIN, MAX_DURATION_MIN, MIN_DURATION_MIN};

/// Timer-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Session length used when nothing valid is stored yet.
    #[serde(default = "default_duration_min")]
    pub default_duration_min: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Logging configuration. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/zinefocus/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_duration_min() -> u32 {
    DEFAULT_DURATION_MIN
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".into()
}
fn default_user_id() -> String {
    "local".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration_min(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            timer: TimerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
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
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("not a leaf value".into()));
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

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if valid_duration(self.timer.default_duration_min).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_duration_min".into(),
                message: format!("must be between {MIN_DURATION_MIN} and {MAX_DURATION_MIN}"),
            });
        }
        if self.timer.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.tick_interval_ms".into(),
                message: "must be positive".into(),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "user_id".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
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
        assert_eq!(parsed.timer.default_duration_min, 25);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("user_id = \"mara\"\n").unwrap();
        assert_eq!(parsed.user_id, "mara");
        assert_eq!(parsed.timer, TimerConfig::default());
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.default_duration_min").as_deref(), Some("25"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("info"));
        assert_eq!(cfg.get("user_id").as_deref(), Some("local"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("timer.default_duration_min", "50").unwrap();
        cfg.apply("logging.level", "debug").unwrap();
        assert_eq!(cfg.timer.default_duration_min, 50);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_out_of_range_duration() {
        let mut cfg = Config::default();
        assert!(cfg.apply("timer.default_duration_min", "0").is_err());
        assert!(cfg.apply("timer.default_duration_min", "121").is_err());
        assert!(cfg.apply("timer.default_duration_min", "abc").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert_eq!(first, Config::default());
        assert!(path.exists());

        let mut changed = first.clone();
        changed.apply("user_id", "mara").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().user_id, "mara");
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer]\ndefault_duration_min = 500\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
