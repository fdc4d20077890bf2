//! Configuration file loading
//!
//! Finds and parses configuration files from the usual locations, with
//! format detection by extension and graceful fallback to defaults when
//! no file exists.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RESKETCH_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files, in priority order
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with the standard search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::search_paths(),
        }
    }

    /// Load configuration from the first existing search path, falling
    /// back to defaults when none exists.
    pub fn load() -> Result<Config> {
        let loader = Self::new();
        match loader.find_config_file() {
            Some(path) => {
                debug!("loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                debug!("no config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Load and parse a specific configuration file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: "JSON".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: "TOML".to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// First existing file among the search paths
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|path| path.is_file()).cloned()
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            paths.push(PathBuf::from(path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("resketch").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".resketch").join("config.toml"));
        }

        paths.push(PathBuf::from("resketch.toml"));

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
