//! Configuration builder for layered configuration loading

use crate::{ConfigResult, PiglitConfig, Section};
use config::{ConfigBuilder as ConfigBuilderInner, File, FileFormat, Source, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration builder for loading configuration from multiple sources
///
/// Sources are applied in the order they were added; a key set by a later
/// source replaces the same key from an earlier one.
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Inline { contents: String, format: FileFormat },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
        }
    }

    /// Add a configuration file source; missing files are skipped
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add a configuration file source with explicit format
    pub fn add_source_file_with_format<P: AsRef<Path>>(
        mut self,
        path: P,
        format: FileFormat,
    ) -> Self {
        let path = path.as_ref().to_path_buf();
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add configuration text held in memory
    pub fn add_source_str<S: Into<String>>(mut self, contents: S, format: FileFormat) -> Self {
        self.sources.push(ConfigSource::Inline {
            contents: contents.into(),
            format,
        });
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> ConfigResult<PiglitConfig> {
        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        debug!("Loading configuration from {}", path.display());
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    } else {
                        debug!("Skipping missing configuration file {}", path.display());
                    }
                }
                ConfigSource::Inline { contents, format } => {
                    self.inner = self.inner.add_source(File::from_str(contents, *format));
                }
            }
        }

        let config = self.inner.build()?;
        let mut result = PiglitConfig::new();

        for (name, value) in config.collect()? {
            match Self::section_from_value(value) {
                Some(section) => {
                    for (key, value) in section {
                        result.set(name.clone(), key, value);
                    }
                }
                None => debug!("Ignoring configuration value '{}' outside a section", name),
            }
        }

        Ok(result)
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Ini, // piglit.conf
        }
    }

    /// Flatten a table value into string entries, dropping nested tables
    fn section_from_value(value: Value) -> Option<Section> {
        let table = value.into_table().ok()?;
        let mut section = Section::new();
        for (key, value) in table {
            match value.into_string() {
                Ok(value) => {
                    section.insert(key, value);
                }
                Err(e) => debug!("Ignoring non-scalar configuration key '{}': {}", key, e),
            }
        }
        Some(section)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
