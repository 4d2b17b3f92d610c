//! Errors raised while loading `piglit.conf`

use piglit_types::Error as PiglitError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or interpret a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A single file is not valid in its format
    #[error("malformed configuration in '{path}': {message}")]
    Parse {
        /// Configuration file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Merging the layered sources failed
    #[error("cannot merge configuration sources: {source}")]
    Merge {
        /// Error reported by the `config` crate
        #[from]
        source: config::ConfigError,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Parse failure in `path`
    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for PiglitError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io { source, .. } => PiglitError::Io { source },
            other => PiglitError::config(other.to_string()),
        }
    }
}
