//! Active compression mode
//!
//! [`Compression`] bundles a registry with the mode selected for this process.
//! It is resolved once at startup and handed to whatever writes result files;
//! its mode is always a key of its registry.

use crate::registry::{CompressionRegistry, Compressor, Decompressor};
use crate::resolver::{ModeInputs, ModeResolver};
use crate::stream::{CompressedWriter, DecompressedReader};
use piglit_config::PiglitConfig;
use piglit_types::{Error, Mode, ModeSource, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry plus the active mode
#[derive(Debug, Clone)]
pub struct Compression {
    registry: Arc<CompressionRegistry>,
    mode: Mode,
    source: ModeSource,
}

impl Compression {
    /// Use `mode`, which must be registered
    pub fn new(registry: Arc<CompressionRegistry>, mode: &str) -> Result<Self> {
        let mode = registry.mode(mode)?.clone();
        Ok(Self {
            registry,
            mode,
            source: ModeSource::Explicit,
        })
    }

    /// Resolve the mode from `inputs`
    pub fn resolve(registry: Arc<CompressionRegistry>, inputs: &ModeInputs) -> Result<Self> {
        let resolved = ModeResolver::new(&registry).resolve(inputs)?;
        Ok(Self {
            registry,
            mode: resolved.mode,
            source: resolved.source,
        })
    }

    /// Resolve the mode from the process environment and `config`
    pub fn from_process(registry: Arc<CompressionRegistry>, config: &PiglitConfig) -> Result<Self> {
        let compression = Self::resolve(registry, &ModeInputs::from_process(config))?;
        info!(
            "Using '{}' compression (from {})",
            compression.mode, compression.source
        );
        Ok(compression)
    }

    /// The active mode
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Where the active mode came from
    pub fn source(&self) -> ModeSource {
        self.source
    }

    /// The registry backing this context
    pub fn registry(&self) -> &CompressionRegistry {
        &self.registry
    }

    /// Switch to another registered mode, returning the previous one
    pub fn set_mode(&mut self, mode: &str) -> Result<Mode> {
        let mode = self.registry.mode(mode)?.clone();
        debug!("Switching compression mode from '{}' to '{}'", self.mode, mode);
        self.source = ModeSource::Explicit;
        Ok(std::mem::replace(&mut self.mode, mode))
    }

    /// Switch mode until the returned guard is dropped
    pub fn override_mode(&mut self, mode: &str) -> Result<ModeOverride<'_>> {
        let previous_source = self.source;
        let previous = self.set_mode(mode)?;
        Ok(ModeOverride {
            compression: self,
            previous: Some((previous, previous_source)),
        })
    }

    /// Suffix for files written in the active mode
    pub fn suffix(&self) -> Option<String> {
        self.mode.suffix()
    }

    /// `base` with the active mode's suffix appended
    pub fn final_path<P: AsRef<Path>>(&self, base: P) -> PathBuf {
        append_suffix(base.as_ref(), &self.mode)
    }

    /// Compressor for the active mode
    pub fn compressor(&self) -> Result<Compressor> {
        self.registry.compressor_for(self.mode.as_str())
    }

    /// Decompressor for the active mode
    pub fn decompressor(&self) -> Result<Decompressor> {
        self.registry.decompressor_for(self.mode.as_str())
    }

    /// Open exactly `path` for writing in the active mode
    pub fn open_write<P: AsRef<Path>>(&self, path: P) -> Result<CompressedWriter> {
        self.compressor()?.open(path)
    }

    /// Open exactly `path` for reading in the active mode
    pub fn open_read<P: AsRef<Path>>(&self, path: P) -> Result<DecompressedReader> {
        self.decompressor()?.open(path)
    }

    /// Write `base` plus suffix through `f`, returning the path written
    pub fn write_final<P, F>(&self, base: P, f: F) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut CompressedWriter) -> Result<()>,
    {
        let path = self.final_path(base);
        self.registry
            .with_compressor(self.mode.as_str(), &path, f)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Find and open a file written by [`Compression::write_final`] in any registered mode
    pub fn open_final<P: AsRef<Path>>(&self, base: P) -> Result<DecompressedReader> {
        let base = base.as_ref();
        // The active mode's file wins if several exist.
        let candidates = std::iter::once(&self.mode)
            .chain(self.registry.modes().filter(|m| **m != self.mode));

        for mode in candidates {
            let path = append_suffix(base, mode);
            if path.is_file() {
                return self.registry.open_read(mode.as_str(), path);
            }
        }

        Err(Error::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no results file found for {}", base.display()),
            ),
        })
    }
}

/// Guard returned by [`Compression::override_mode`]
#[derive(Debug)]
pub struct ModeOverride<'a> {
    compression: &'a mut Compression,
    previous: Option<(Mode, ModeSource)>,
}

impl std::ops::Deref for ModeOverride<'_> {
    type Target = Compression;

    fn deref(&self) -> &Self::Target {
        self.compression
    }
}

impl Drop for ModeOverride<'_> {
    fn drop(&mut self) {
        if let Some((mode, source)) = self.previous.take() {
            self.compression.mode = mode;
            self.compression.source = source;
        }
    }
}

/// Append the suffix for `mode` to `path`
pub fn append_suffix(path: &Path, mode: &Mode) -> PathBuf {
    match mode.suffix() {
        Some(suffix) => {
            let mut name = OsString::from(path.as_os_str());
            name.push(suffix);
            PathBuf::from(name)
        }
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piglit_types::ErrorKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn builtin() -> Arc<CompressionRegistry> {
        Arc::new(CompressionRegistry::with_builtin())
    }

    #[test]
    fn test_new_rejects_unknown_mode() {
        let err = Compression::new(builtin(), "foobar").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMode);
    }

    #[test]
    fn test_resolve_records_source() {
        let compression =
            Compression::resolve(builtin(), &ModeInputs::new().with_config("zst")).unwrap();
        assert_eq!(compression.mode().as_str(), "zst");
        assert_eq!(compression.source(), ModeSource::Config);
    }

    #[test]
    fn test_set_mode_returns_previous() {
        let mut compression = Compression::new(builtin(), "gz").unwrap();
        let previous = compression.set_mode("none").unwrap();
        assert_eq!(previous.as_str(), "gz");
        assert!(compression.mode().is_none());

        assert!(compression.set_mode("foobar").is_err());
        assert!(compression.mode().is_none());
    }

    #[test]
    fn test_override_mode_restores() {
        let mut compression =
            Compression::resolve(builtin(), &ModeInputs::new().with_env("lz4")).unwrap();
        {
            let overridden = compression.override_mode("gz").unwrap();
            assert_eq!(overridden.mode().as_str(), "gz");
            assert_eq!(overridden.source(), ModeSource::Explicit);
        }
        assert_eq!(compression.mode().as_str(), "lz4");
        assert_eq!(compression.source(), ModeSource::Environment);
    }

    #[test]
    fn test_final_path_suffix() {
        let gz = Compression::new(builtin(), "gz").unwrap();
        assert_eq!(gz.final_path("out/results.txt"), PathBuf::from("out/results.txt.gz"));

        let none = Compression::new(builtin(), "none").unwrap();
        assert_eq!(none.final_path("out/results.txt"), PathBuf::from("out/results.txt"));
    }

    #[test]
    fn test_write_final_and_open_final() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("results.txt");

        let writer = Compression::new(builtin(), "zst").unwrap();
        let path = writer
            .write_final(&base, |w| {
                w.write_all(b"foo: pass\n")?;
                Ok(())
            })
            .unwrap();
        assert!(path.to_string_lossy().ends_with("results.txt.zst"));

        // A reader configured for another mode still finds the file.
        let reader = Compression::new(builtin(), "gz").unwrap();
        let content = reader.open_final(&base).unwrap().read_string().unwrap();
        assert_eq!(content, "foo: pass\n");
    }

    #[test]
    fn test_handles_follow_active_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.txt.br");
        let compression = Compression::new(builtin(), "br").unwrap();

        let compressor = compression.compressor().unwrap();
        assert_eq!(compressor.mode().as_str(), "br");
        let mut writer = compressor.open(&path).unwrap();
        writer.write_str("foo: pass\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(compression.decompressor().unwrap().mode().as_str(), "br");
        let content = compression.open_read(&path).unwrap().read_string().unwrap();
        assert_eq!(content, "foo: pass\n");

        let mut writer = compression.open_write(&path).unwrap();
        writer.write_str("bar: fail\n").unwrap();
        writer.finish().unwrap();
        let reader = compression.decompressor().unwrap().open(&path).unwrap();
        assert_eq!(reader.read_string().unwrap(), "bar: fail\n");
    }

    #[test]
    fn test_open_final_missing() {
        let temp_dir = TempDir::new().unwrap();
        let compression = Compression::new(builtin(), "gz").unwrap();
        let err = compression
            .open_final(temp_dir.path().join("results.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
