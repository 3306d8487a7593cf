//! Configuration management.
//!
//! Values are layered, lowest precedence first: built-in defaults, a TOML
//! config file, then `SITEREPO_*` environment variables.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default number of undelivered change notifications buffered per observer.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 64;

/// Database file name used inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "sites.db";

/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "SITEREPO_DATA_DIR";
/// Environment variable overriding the database path.
pub const ENV_DATABASE: &str = "SITEREPO_DATABASE";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "SITEREPO_LOG_LEVEL";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "SITEREPO_LOG_FORMAT";

/// Main configuration for siterepo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRepoConfig {
    /// Directory holding the database.
    pub data_dir: PathBuf,
    /// Path to the `SQLite` database.
    pub database_path: PathBuf,
    /// Change-notification buffer size per observer.
    pub notify_capacity: usize,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info").
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Database path.
    pub database: Option<String>,
    /// Notification buffer size.
    pub notify_capacity: Option<usize>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Log level.
    pub level: Option<String>,
    /// Log format.
    pub format: Option<String>,
}

impl Default for SiteRepoConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            database_path: data_dir.join(DEFAULT_DATABASE_FILE),
            data_dir,
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
            logging: LoggingSettings::default(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "siterepo")
}

fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".siterepo"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

impl SiteRepoConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration from the process environment and a config file.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if a file is present there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(Self::read_file(path)?),
            None => match Self::default_path() {
                Some(path) if path.exists() => Some(Self::read_file(&path)?),
                _ => None,
            },
        };
        Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    /// Parses a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_file(path: &Path) -> Result<ConfigFile> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
    }

    /// Merges a parsed file and environment lookups over the defaults.
    ///
    /// A database path that is not set explicitly follows the data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `notify_capacity` is zero.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let logging = file.logging.unwrap_or_default();

        let data_dir = env(ENV_DATA_DIR)
            .or(file.data_dir)
            .map_or(defaults.data_dir, PathBuf::from);
        let database_path = env(ENV_DATABASE)
            .or(file.database)
            .map_or_else(|| data_dir.join(DEFAULT_DATABASE_FILE), PathBuf::from);

        let notify_capacity = file.notify_capacity.unwrap_or(defaults.notify_capacity);
        if notify_capacity == 0 {
            return Err(Error::InvalidInput(
                "notify_capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            database_path,
            notify_capacity,
            logging: LoggingSettings {
                level: env(ENV_LOG_LEVEL)
                    .or(logging.level)
                    .unwrap_or(defaults.logging.level),
                format: env(ENV_LOG_FORMAT)
                    .or(logging.format)
                    .unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Sets the data directory and moves the database into it.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self.database_path = self.data_dir.join(DEFAULT_DATABASE_FILE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = SiteRepoConfig::resolve(ConfigFile::default(), no_env).unwrap();
        assert_eq!(config.notify_capacity, DEFAULT_NOTIFY_CAPACITY);
        assert_eq!(config.database_path, config.data_dir.join("sites.db"));
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_file_values_apply() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/tmp/siterepo-test"
notify_capacity = 8

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let parsed = SiteRepoConfig::read_file(file.path()).unwrap();
        let config = SiteRepoConfig::resolve(parsed, no_env).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/siterepo-test"));
        assert_eq!(
            config.database_path,
            PathBuf::from("/tmp/siterepo-test/sites.db")
        );
        assert_eq!(config.notify_capacity, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            data_dir: Some("/from/file".to_string()),
            database: Some("/from/file/other.db".to_string()),
            ..ConfigFile::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE, "/from/env/sites.db"),
            (ENV_LOG_LEVEL, "trace"),
        ]
        .into_iter()
        .collect();

        let config =
            SiteRepoConfig::resolve(file, |key| env.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/file"));
        assert_eq!(config.database_path, PathBuf::from("/from/env/sites.db"));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let file = ConfigFile {
            notify_capacity: Some(0),
            ..ConfigFile::default()
        };
        assert!(matches!(
            SiteRepoConfig::resolve(file, no_env),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "colour = \"blue\"").unwrap();
        assert!(matches!(
            SiteRepoConfig::read_file(file.path()),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(SiteRepoConfig::load(Some(&missing)).is_err());
    }
}
