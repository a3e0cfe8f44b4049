//! Configuration file handling for ~/.jagalari/config.ini.
//!
//! A missing file means "all defaults"; `jagalari config init` writes one
//! out so the operator has something to edit.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Errors from reading, validating or writing config.ini.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The INI file could not be read or tokenized
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// A key was present but its value is unusable
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.jagalari/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.jagalari/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write the full commented file to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Write a default config.ini unless one is already there.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// ~/.jagalari, or ./.jagalari when there is no home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jagalari")
}

/// ~/.jagalari/config.ini
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_point_at_demo_server() {
        let config = ConfigFile::default();

        assert_eq!(config.telemetry.url, DEFAULT_TELEMETRY_URL);
        assert_eq!(config.telemetry.timeout, DEFAULT_TELEMETRY_TIMEOUT_SECS);
        assert_eq!(config.map.default_zoom, DEFAULT_MAP_ZOOM);
        assert!(config.location.latitude.is_none());
        assert!(config.storage.path.starts_with(config_directory()));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.ini");

        let config = ConfigFile::load_from(&missing).unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");
        let mut config = ConfigFile::default();
        config.telemetry.email = "dispatch@example.com".to_string();

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.telemetry.email, "dispatch@example.com");
    }

    #[test]
    fn test_invalid_file_reports_value() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[map]\ndefault_zoom = huge\n").unwrap();

        let err = ConfigFile::load_from(&config_path).unwrap_err();

        assert!(err.to_string().contains("map.default_zoom"));
    }
}
