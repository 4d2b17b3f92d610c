//! Configuration loader utilities

use crate::{ConfigBuilder, ConfigError, ConfigResult, PiglitConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the first `piglit.conf` found in the default locations
    pub fn load_default() -> ConfigResult<PiglitConfig> {
        match Self::config_exists() {
            Some(path) => {
                debug!("Using configuration file {}", path.display());
                ConfigBuilder::new().add_source_file(path).build()
            }
            None => {
                debug!("No {} found, using an empty configuration", CONFIG_FILE_NAME);
                Ok(PiglitConfig::new())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<PiglitConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_source_file(path)
            .build()
            .map_err(|e| ConfigError::parse(path, e.to_string()))
    }

    /// Load configuration from multiple files (later files override earlier ones)
    pub fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> ConfigResult<PiglitConfig> {
        paths
            .iter()
            .fold(ConfigBuilder::new(), |builder, path| {
                builder.add_source_file(path)
            })
            .build()
    }

    /// Load an explicit file if given, otherwise search the default locations
    pub fn load(path: Option<&Path>) -> ConfigResult<PiglitConfig> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    /// Get default configuration file paths in order of preference
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Some(dir) = dirs::xdg_config_home() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        if let Some(dir) = dirs::home_config() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }

        paths.dedup();
        paths
    }

    /// Check if a configuration file exists in default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.is_file())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn xdg_config_home() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    pub fn home_config() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|value| !value.is_empty())
            .map(|home| PathBuf::from(home).join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_missing_file() {
        let result = ConfigLoader::load_from_file("/nonexistent/piglit.conf");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[core]\ncompression = none\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.compression(), Some("none"));

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.compression(), Some("none"));
    }

    #[test]
    fn test_load_from_files_layers() {
        let temp_dir = TempDir::new().unwrap();
        let system = temp_dir.path().join("system.conf");
        let user = temp_dir.path().join("user.conf");
        std::fs::write(&system, "[core]\ncompression = gz\n").unwrap();
        std::fs::write(&user, "[core]\ncompression = zst\n").unwrap();

        let config = ConfigLoader::load_from_files(&[&system, &user]).unwrap();
        assert_eq!(config.compression(), Some("zst"));
    }

    #[test]
    fn test_default_paths_start_with_working_directory() {
        let paths = ConfigLoader::default_config_paths();
        assert_eq!(paths[0], PathBuf::from(CONFIG_FILE_NAME));
        assert!(paths.iter().all(|p| p.ends_with(CONFIG_FILE_NAME)));
    }
}
