//! Configuration loading for idrotate.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rotation::StorePaths;
use crate::stores::registry::{DEFAULT_KEY, DEFAULT_VALUE_NAME};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "IDROTATE_CONFIG";

/// Errors that can occur while loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Cannot determine the user's config directory")]
    NoConfigDir,
}

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Where the target application keeps its per-user data.
#[derive(Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The application's `User` directory.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// Registry step settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_registry_key")]
    pub key: String,
    #[serde(default = "default_registry_value_name")]
    pub value_name: String,
}

fn default_base_path() -> String {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("Cursor").join("User"))
        .unwrap_or_else(|| PathBuf::from("~/.config/Cursor/User"))
        .to_string_lossy()
        .into_owned()
}

fn default_true() -> bool {
    true
}

fn default_registry_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_registry_value_name() -> String {
    DEFAULT_VALUE_NAME.to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key: default_registry_key(),
            value_name: default_registry_value_name(),
        }
    }
}

impl Config {
    /// Load config from `$IDROTATE_CONFIG` or the platform config dir, or
    /// return defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load config from a specific file, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        ProjectDirs::from("", "", "idrotate").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Write the default configuration to `path` unless a file is already there.
    ///
    /// Returns `false` if the file existed and was left alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` if the file cannot be written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }

        let write_error = |reason: String| ConfigError::Write {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }

        let contents =
            toml::to_string_pretty(&Config::default()).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| write_error(e.to_string()))?;
        Ok(true)
    }

    /// The application's `User` directory with `~` expanded.
    #[must_use]
    pub fn base_path(&self) -> PathBuf {
        expand_tilde(&self.paths.base_path)
    }

    /// Resolve every store location from the base path.
    #[must_use]
    pub fn store_paths(&self) -> StorePaths {
        let base = self.base_path();
        let global_storage = base.join("globalStorage");
        // machineid sits in the application data dir, one level above User.
        let app_dir = base.parent().map_or_else(|| base.clone(), Path::to_path_buf);

        StorePaths {
            document: global_storage.join("storage.json"),
            flat_file: app_dir.join("machineid"),
            relational: global_storage.join("state.vscdb"),
            backup_dir: global_storage.join("backups"),
        }
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(base_dirs) = BaseDirs::new()
    {
        return base_dirs.home_dir().join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("nope.toml")).unwrap();
        assert!(config.registry.enabled);
        assert_eq!(config.registry.key, DEFAULT_KEY);
        assert!(config.paths.base_path.ends_with("User"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[registry]\nenabled = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert!(!config.registry.enabled);
        assert_eq!(config.registry.value_name, DEFAULT_VALUE_NAME);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[paths\nbase_path = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn store_paths_derive_from_base() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let base = temp.path().join("Cursor/User");
        std::fs::write(
            &path,
            format!("[paths]\nbase_path = {:?}\n", base.to_string_lossy()),
        )
        .unwrap();

        let paths = Config::load_from(&path).unwrap().store_paths();

        assert_eq!(paths.document, base.join("globalStorage/storage.json"));
        assert_eq!(paths.relational, base.join("globalStorage/state.vscdb"));
        assert_eq!(paths.backup_dir, base.join("globalStorage/backups"));
        assert_eq!(paths.flat_file, temp.path().join("Cursor/machineid"));
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        assert!(Config::write_default(&path).unwrap());
        std::fs::write(&path, "# edited").unwrap();
        assert!(!Config::write_default(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited");
    }

    #[test]
    fn default_config_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        Config::write_default(&path).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.paths.base_path, default_base_path());
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde("~/Cursor/User");
        assert!(expanded.ends_with("Cursor/User"));
        assert!(!expanded.starts_with("~"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
