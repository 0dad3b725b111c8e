//! CLI configuration.
//!
//! Stored at `~/.config/authstash/config.json`. Every field is optional;
//! command-line flags and `AUTHSTASH_*` environment variables win over it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "authstash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the session mirror lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend: Option<Backend>,
    pub data_dir: Option<PathBuf>,
    pub keyring_service: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Configured directory for the file mirror, if any
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn keyring_service(&self) -> &str {
        self.keyring_service.as_deref().unwrap_or(APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.backend, None);
        assert_eq!(config.keyring_service(), "authstash");
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"backend": "keyring", "data_dir": "/tmp/stash", "keyring_service": "myapp"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend, Some(Backend::Keyring));
        assert_eq!(config.data_dir(), Some(Path::new("/tmp/stash")));
        assert_eq!(config.keyring_service(), "myapp");
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "floppy"}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
