//! Compression mode identifiers

use crate::{Error, Result, NONE_MODE};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Name of a compression scheme, e.g. `gz` or `none`
///
/// A mode name doubles as the file suffix of compressed output, so it is
/// restricted to ASCII alphanumerics, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Mode(String);

impl Mode {
    /// Create a mode after validating its name
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if Self::is_valid_name(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidModeName { name })
        }
    }

    /// The pass-through mode
    pub fn none() -> Self {
        Self(NONE_MODE.to_string())
    }

    /// Check whether `name` is usable as a mode
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Get the mode name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the pass-through mode
    pub fn is_none(&self) -> bool {
        self.0 == NONE_MODE
    }

    /// Suffix appended to files written in this mode, including the dot
    pub fn suffix(&self) -> Option<String> {
        if self.is_none() {
            None
        } else {
            Some(format!(".{}", self.0))
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Mode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.0
    }
}

impl AsRef<str> for Mode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Mode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where a resolved mode came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModeSource {
    /// The `PIGLIT_COMPRESSION` environment variable
    Environment,
    /// The `[core] compression` configuration value
    Config,
    /// The built-in default
    Default,
    /// Set explicitly by the caller
    Explicit,
}

impl fmt::Display for ModeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Environment => "environment",
            Self::Config => "config",
            Self::Default => "default",
            Self::Explicit => "explicit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("none")]
    #[case("gz")]
    #[case("zst")]
    #[case("lz4")]
    #[case("my_mode-2")]
    fn test_valid_names(#[case] name: &str) {
        let mode = Mode::new(name).unwrap();
        assert_eq!(mode.as_str(), name);
        assert_eq!(mode.to_string(), name);
    }

    #[rstest]
    #[case("")]
    #[case("g z")]
    #[case("../gz")]
    #[case("gz.bak")]
    #[case("gz/")]
    fn test_invalid_names(#[case] name: &str) {
        let err = Mode::new(name).unwrap_err();
        assert!(matches!(err, Error::InvalidModeName { .. }));
        assert!(name.parse::<Mode>().is_err());
    }

    #[test]
    fn test_suffix() {
        assert_eq!(Mode::new("gz").unwrap().suffix().as_deref(), Some(".gz"));
        assert_eq!(Mode::none().suffix(), None);
    }

    #[test]
    fn test_mode_source_display() {
        assert_eq!(ModeSource::Environment.to_string(), "environment");
        assert_eq!(ModeSource::Config.to_string(), "config");
        assert_eq!(ModeSource::Default.to_string(), "default");
    }

    proptest! {
        #[test]
        fn test_valid_names_never_contain_separators(name in "[A-Za-z0-9_-]{1,16}") {
            let mode = Mode::new(name.clone()).unwrap();
            prop_assert_eq!(mode.as_str(), name.as_str());
            prop_assert!(!mode.as_str().contains('.'));
            prop_assert!(!mode.as_str().contains('/'));
        }
    }
}
