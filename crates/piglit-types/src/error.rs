//! Error types and handling for piglit result compression
//!
//! Every fallible operation in the workspace returns [`Error`]. I/O failures keep
//! the original [`std::io::Error`] as their source so callers can inspect it
//! unchanged.

use crate::ModeSource;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Medium severity - the current operation failed
    Medium,
    /// High severity - the caller asked for something that cannot work
    High,
    /// Critical severity - the process cannot start
    Critical,
}

/// Main error type for piglit compression operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Requested mode is not registered
    #[error("Unknown compression mode: {mode}")]
    UnknownMode {
        /// The mode that was requested
        mode: String,
    },

    /// Resolved mode is not registered
    #[error("Compression mode '{mode}' from {origin} is not valid")]
    InvalidMode {
        /// The mode that was resolved
        mode: String,
        /// Where the mode came from
        origin: ModeSource,
    },

    /// Mode name cannot be used as a file suffix
    #[error("Invalid compression mode name: '{name}'")]
    InvalidModeName {
        /// The rejected name
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Results backend error
    #[error("Backend error: {message}")]
    Backend {
        /// Error message describing the backend issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Unregistered mode requested
    UnknownMode,
    /// Unregistered mode resolved
    InvalidMode,
    /// Malformed mode name
    InvalidModeName,
    /// Configuration errors
    Config,
    /// Backend errors
    Backend,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::UnknownMode { .. } => ErrorKind::UnknownMode,
            Self::InvalidMode { .. } => ErrorKind::InvalidMode,
            Self::InvalidModeName { .. } => ErrorKind::InvalidModeName,
            Self::Config { .. } => ErrorKind::Config,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } | Self::Backend { .. } => ErrorSeverity::Medium,
            Self::UnknownMode { .. } | Self::InvalidModeName { .. } => ErrorSeverity::High,
            Self::Config { .. } => ErrorSeverity::High,
            Self::InvalidMode { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether the process should stop rather than report and continue
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Create a new unknown mode error
    pub fn unknown_mode<S: Into<String>>(mode: S) -> Self {
        Self::UnknownMode { mode: mode.into() }
    }

    /// Create a new invalid mode error
    pub fn invalid_mode<S: Into<String>>(mode: S, origin: ModeSource) -> Self {
        Self::InvalidMode {
            mode: mode.into(),
            origin,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new backend error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
