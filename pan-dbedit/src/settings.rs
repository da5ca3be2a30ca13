//! Run settings loaded from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::predefined::{default_predefined, load_predefined, Predefined, PredefinedLoadError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Write a per-run log file next to the console output.
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_prefix: "Firewall_API_Output".to_string(),
            file: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub release_attempts: u32,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            release_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredefinedSettings {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub locks: LockSettings,
    pub predefined: PredefinedSettings,
}

#[derive(Debug, Error)]
pub enum SettingsLoadError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Predefined(#[from] PredefinedLoadError),
}

impl Settings {
    /// Load from `path`, or defaults when no file was named.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsLoadError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| SettingsLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsLoadError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Predefined names from the configured override file, else the embedded overlay.
    pub fn predefined(&self) -> Result<Predefined, SettingsLoadError> {
        match &self.predefined.file {
            Some(path) => Ok(load_predefined(path)?),
            None => Ok(default_predefined()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let settings: Settings = toml::from_str("[locks]\nrelease_attempts = 3\n").expect("parse");
        assert_eq!(settings.locks.release_attempts, 3);
        assert_eq!(settings.logging.file_prefix, "Firewall_API_Output");
        assert!(settings.logging.file);
        assert!(settings.predefined.file.is_none());
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(Settings::load(None).expect("defaults"), Settings::default());
    }

    #[test]
    fn named_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
        assert!(matches!(err, SettingsLoadError::Io { .. }));
    }
}
