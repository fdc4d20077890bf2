//! Configuration management for resketch
//!
//! Provides the TOML/JSON configuration surface: poll interval, extension
//! filter, interpreter selection, and child environment. Every section has
//! defaults so a missing or partial file is never fatal.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure for resketch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File-watch configuration
    pub watch: WatchConfig,

    /// Script host configuration
    pub host: HostConfig,
}

impl Config {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.interval_ms)
    }

    /// Validate field values, reporting the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.watch.interval_ms < WatchConfig::MIN_INTERVAL_MS {
            return Err(Error::ConfigValidationFailed {
                field: "watch.interval_ms".to_string(),
                reason: format!("must be at least {}", WatchConfig::MIN_INTERVAL_MS),
            });
        }
        if let Some(ext) = self
            .watch
            .extensions
            .iter()
            .find(|ext| ext.trim_start_matches('.').is_empty())
        {
            return Err(Error::ConfigValidationFailed {
                field: "watch.extensions".to_string(),
                reason: format!("invalid extension entry '{}'", ext),
            });
        }
        Ok(())
    }
}

/// File-watch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll tick interval in milliseconds
    pub interval_ms: u64,

    /// Extra file extensions to watch beyond the sketch's own
    pub extensions: Vec<String>,
}

impl WatchConfig {
    /// Shortest accepted poll interval; anything below is busy-spinning
    pub const MIN_INTERVAL_MS: u64 = 10;
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            extensions: Vec::new(),
        }
    }
}

/// Script host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Interpreter executable; empty means derive from the sketch's
    /// file extension
    pub interpreter: String,

    /// Arguments passed to the interpreter before the sketch path
    pub args: Vec<String>,

    /// Whether the child inherits this process's environment
    pub inherit_env: bool,

    /// Extra environment variables for the child
    pub environment: HashMap<String, String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            interpreter: String::new(),
            args: Vec::new(),
            inherit_env: true,
            environment: HashMap::new(),
        }
    }
}
