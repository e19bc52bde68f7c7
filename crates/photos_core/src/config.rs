//! Runtime configuration for the photo library core.
//!
//! # Responsibility
//! - Resolve the snapshot location and logging settings from the process
//!   environment, falling back to built-in defaults.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - The snapshot path defaults to `data/users.dat`.

use crate::logging::{default_log_level, init_logging};
use std::path::{Path, PathBuf};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/users.dat";
pub const ENV_DATA_FILE: &str = "PHOTOS_DATA_FILE";
pub const ENV_LOG_LEVEL: &str = "PHOTOS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PHOTOS_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Snapshot file read at startup and rewritten after each mutation.
    pub snapshot_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads `PHOTOS_DATA_FILE`, `PHOTOS_LOG_LEVEL` and `PHOTOS_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            snapshot_path: read(ENV_DATA_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    pub fn with_snapshot_path(mut self, path: impl AsRef<Path>) -> Self {
        self.snapshot_path = path.as_ref().to_path_buf();
        self
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is left disabled.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&self.log_level, log_dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_SNAPSHOT_PATH, ENV_DATA_FILE, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        assert_eq!(config.log_dir, None);
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_DATA_FILE, " /srv/photos/users.dat "),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/var/log/photos"),
        ]));
        assert_eq!(config.snapshot_path, PathBuf::from("/srv/photos/users.dat"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/photos")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[(ENV_DATA_FILE, "   ")]));
        assert_eq!(config.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT_PATH));
    }

    #[test]
    fn init_logging_is_skipped_without_log_dir() {
        let config = AppConfig::default();
        assert_eq!(config.init_logging(), Ok(false));
    }
}
