//! Error types and Result aliases for resketch

use std::fmt;
use std::path::PathBuf;

/// Result type alias for resketch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for resketch
#[derive(Debug)]
pub enum Error {
    // === Startup errors ===
    /// Sketch file does not exist or is not a regular file
    SketchNotFound {
        path: PathBuf,
    },

    /// No interpreter is known for the sketch's file extension
    InterpreterNotFound {
        extension: String,
    },

    /// Failed to spawn the host interpreter process
    HostSpawnFailed {
        command: String,
        reason: String,
    },

    /// Failed to spawn the execution thread
    ExecThreadSpawnFailed {
        reason: String,
    },

    // === Script-level errors ===
    /// The sketch terminated with a failure status
    SketchFailed {
        reason: String,
    },

    // === Cleanup errors ===
    /// Failed to dispose a sketch instance
    DisposeFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration file not found
    ConfigNotFound,

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Startup errors
            Error::SketchNotFound { path } => {
                write!(f, "Sketch file not found -- '{}'", path.display())
            }
            Error::InterpreterNotFound { extension } => {
                write!(f, "No interpreter known for extension '{}'", extension)
            }
            Error::HostSpawnFailed { command, reason } => {
                write!(f, "Failed to spawn interpreter '{}': {}", command, reason)
            }
            Error::ExecThreadSpawnFailed { reason } => {
                write!(f, "Failed to spawn execution thread: {}", reason)
            }

            // Script-level errors
            Error::SketchFailed { reason } => {
                write!(f, "Sketch failed: {}", reason)
            }

            // Cleanup errors
            Error::DisposeFailed { reason } => {
                write!(f, "Failed to dispose sketch instance: {}", reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => {
                write!(f, "Configuration file not found")
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
