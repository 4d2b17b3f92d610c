//! Core type system and error handling for piglit result compression
//!
//! This crate provides the foundational types shared by every other crate in the
//! workspace:
//!
//! - **Error handling**: A single [`Error`] enum with kinds and severity levels
//! - **Modes**: The [`Mode`] newtype naming a compression scheme
//! - **Constants**: The environment variable, config key and default mode used
//!   when resolving the active compression mode
//!
//! # Features
//!
//! - `serde`: Enable serialization support for [`Mode`] and [`ModeSource`]
//!
//! # Examples
//!
//! ```rust
//! use piglit_types::{Error, Mode, Result};
//!
//! fn pick(name: &str) -> Result<Mode> {
//!     let mode = Mode::new(name)?;
//!     Ok(mode)
//! }
//!
//! assert_eq!(pick("gz").unwrap().suffix(), Some(".gz".to_string()));
//! assert!(matches!(pick("g z"), Err(Error::InvalidModeName { .. })));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mode;
pub mod result;

pub use error::{Error, ErrorKind, ErrorSeverity};
pub use mode::{Mode, ModeSource};
pub use result::Result;

/// Environment variable overriding the configured compression mode
pub const COMPRESSION_ENV_VAR: &str = "PIGLIT_COMPRESSION";

/// Configuration section holding the compression key
pub const CONFIG_SECTION: &str = "core";

/// Configuration key naming the compression mode
pub const CONFIG_KEY: &str = "compression";

/// Mode used when neither the environment nor the configuration names one
pub const DEFAULT_MODE: &str = "gz";

/// Name of the pass-through mode
pub const NONE_MODE: &str = "none";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_valid_name() {
        let mode = Mode::new(DEFAULT_MODE).unwrap();
        assert_eq!(mode.as_str(), "gz");
        assert!(!mode.is_none());
    }

    #[test]
    fn test_none_mode_constant() {
        assert!(Mode::none().is_none());
        assert_eq!(Mode::none().as_str(), NONE_MODE);
    }

    #[test]
    fn test_invalid_mode_is_critical() {
        let error = Error::invalid_mode("bogus", ModeSource::Environment);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert_eq!(error.kind(), ErrorKind::InvalidMode);
    }
}
