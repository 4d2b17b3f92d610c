//! Configuration management for piglit result compression
//!
//! piglit reads an INI file, `piglit.conf`, organised in sections. Only one
//! value matters to compression (`[core] compression`), but the whole file is
//! loaded so callers can look up anything with [`PiglitConfig::safe_get`].
//!
//! # Features
//!
//! - **Multiple formats**: INI by default, TOML/YAML/JSON chosen by extension
//! - **Layering**: Later files override values from earlier ones
//! - **Search paths**: `./piglit.conf`, `$XDG_CONFIG_HOME/piglit.conf`,
//!   `~/.config/piglit.conf`
//!
//! # Examples
//!
//! ```rust
//! use piglit_config::{ConfigBuilder, PiglitConfig};
//! use config::FileFormat;
//!
//! let config = ConfigBuilder::new()
//!     .add_source_str("[core]\ncompression = zst\n", FileFormat::Ini)
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! assert_eq!(config.compression(), Some("zst"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use piglit_types::{CONFIG_KEY, CONFIG_SECTION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// File name searched for in the default locations
pub const CONFIG_FILE_NAME: &str = "piglit.conf";

/// Values from one configuration section
pub type Section = BTreeMap<String, String>;

/// Parsed `piglit.conf`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PiglitConfig {
    sections: BTreeMap<String, Section>,
}

impl PiglitConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` in `section`; empty values count as missing
    ///
    /// Option names are case-insensitive, section names are not.
    pub fn safe_get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(&option_name(key)))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Set `key` in `section`, returning the previous value
    pub fn set<S, K, V>(&mut self, section: S, key: K, value: V) -> Option<String>
    where
        S: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(option_name(&key.into()), value.into())
    }

    /// Remove `key` from `section`, returning its value
    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        let values = self.sections.get_mut(section)?;
        let removed = values.remove(&option_name(key));
        if values.is_empty() {
            self.sections.remove(section);
        }
        removed
    }

    /// The `[core] compression` value
    pub fn compression(&self) -> Option<&str> {
        self.safe_get(CONFIG_SECTION, CONFIG_KEY)
    }

    /// Get a whole section
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Iterate over section names
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Whether no values are set
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Overlay `other` on top of `self`, key by key
    pub fn merge(&mut self, other: Self) {
        for (name, values) in other.sections {
            for (key, value) in values {
                self.set(name.clone(), key, value);
            }
        }
    }
}

fn option_name(key: &str) -> String {
    key.to_lowercase()
}
