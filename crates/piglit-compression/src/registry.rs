//! Registry mapping compression modes to codecs
//!
//! The registry is an ordinary value: callers build one, pass it to the
//! resolver and to whatever writes result files. Nothing here is global, so
//! tests construct isolated registries instead of patching a shared one.

use crate::codecs::Codec;
use crate::stream::{CompressedWriter, DecompressedReader, FinishWrite};
use piglit_types::{Error, Mode, Result};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::debug;

/// Mode to codec lookup table
///
/// Compressor and decompressor factories live in the same entry, so the two
/// key sets can never drift apart.
#[derive(Debug, Clone)]
pub struct CompressionRegistry {
    codecs: BTreeMap<Mode, Codec>,
}

impl CompressionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Create a registry holding the built-in codecs
    pub fn with_builtin() -> Self {
        let codecs = Codec::builtin()
            .into_iter()
            .filter_map(|(name, codec)| Mode::new(name).ok().map(|mode| (mode, codec)))
            .collect();
        Self { codecs }
    }

    /// Register a compressor/decompressor pair, returning the entry it replaced
    pub fn register<C, D>(&mut self, mode: Mode, compressor: C, decompressor: D) -> Option<Codec>
    where
        C: Fn(&Path) -> io::Result<Box<dyn FinishWrite>> + Send + Sync + 'static,
        D: Fn(&Path) -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        self.register_codec(mode, Codec::new(compressor, decompressor))
    }

    /// Register a codec, returning the entry it replaced
    pub fn register_codec(&mut self, mode: Mode, codec: Codec) -> Option<Codec> {
        debug!("Registering compression mode '{}'", mode);
        self.codecs.insert(mode, codec)
    }

    /// Register a codec for the lifetime of the returned guard
    ///
    /// Dropping the guard restores the registry to its prior state: the mode is
    /// removed again, or the entry it displaced is put back.
    pub fn register_scoped(&mut self, mode: Mode, codec: Codec) -> ScopedRegistration<'_> {
        let previous = self.register_codec(mode.clone(), codec);
        ScopedRegistration {
            registry: self,
            mode,
            previous,
        }
    }

    /// Remove a mode, returning its codec
    pub fn unregister(&mut self, mode: &str) -> Option<Codec> {
        debug!("Unregistering compression mode '{}'", mode);
        self.codecs.remove(mode)
    }

    /// Whether `mode` is registered
    pub fn contains(&self, mode: &str) -> bool {
        self.codecs.contains_key(mode)
    }

    /// Registered modes in sorted order
    pub fn modes(&self) -> impl Iterator<Item = &Mode> {
        self.codecs.keys()
    }

    /// Number of registered modes
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no modes are registered
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Get the codec for `mode`
    pub fn get(&self, mode: &str) -> Result<&Codec> {
        self.codecs
            .get(mode)
            .ok_or_else(|| Error::unknown_mode(mode))
    }

    /// Get the registered key matching `mode`
    pub fn mode(&self, mode: &str) -> Result<&Mode> {
        self.codecs
            .get_key_value(mode)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::unknown_mode(mode))
    }

    /// Get a handle that opens files for compressed writing in `mode`
    pub fn compressor_for(&self, mode: &str) -> Result<Compressor> {
        let (mode, codec) = self.entry(mode)?;
        Ok(Compressor {
            mode: mode.clone(),
            codec: codec.clone(),
        })
    }

    /// Get a handle that opens files for decompressed reading in `mode`
    pub fn decompressor_for(&self, mode: &str) -> Result<Decompressor> {
        let (mode, codec) = self.entry(mode)?;
        Ok(Decompressor {
            mode: mode.clone(),
            codec: codec.clone(),
        })
    }

    /// Open `path` for compressed writing in `mode`
    pub fn open_write<P: AsRef<Path>>(&self, mode: &str, path: P) -> Result<CompressedWriter> {
        self.compressor_for(mode)?.open(path)
    }

    /// Open `path` for decompressed reading in `mode`
    pub fn open_read<P: AsRef<Path>>(&self, mode: &str, path: P) -> Result<DecompressedReader> {
        self.decompressor_for(mode)?.open(path)
    }

    /// Write `path` in `mode` through `f`, finalizing the file afterwards
    pub fn with_compressor<P, F, T>(&self, mode: &str, path: P, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut CompressedWriter) -> Result<T>,
    {
        let mut writer = self.open_write(mode, path)?;
        let value = f(&mut writer)?;
        writer.finish()?;
        Ok(value)
    }

    /// Detect the mode a file was written in from its suffix
    ///
    /// Files without a registered suffix are treated as uncompressed.
    pub fn mode_for_path<P: AsRef<Path>>(&self, path: P) -> Mode {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.codecs.get_key_value(ext))
            .map(|(mode, _)| mode.clone())
            .filter(|mode| !mode.is_none())
            .unwrap_or_else(Mode::none)
    }

    fn entry(&self, mode: &str) -> Result<(&Mode, &Codec)> {
        self.codecs
            .get_key_value(mode)
            .ok_or_else(|| Error::unknown_mode(mode))
    }
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Factory handle producing [`CompressedWriter`]s for one mode
#[derive(Debug, Clone)]
pub struct Compressor {
    mode: Mode,
    codec: Codec,
}

impl Compressor {
    /// Mode this handle writes
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Create or truncate `path` and return a writer compressing into it
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<CompressedWriter> {
        let path = path.as_ref();
        let inner = (self.codec.compressor())(path)?;
        Ok(CompressedWriter::new(
            self.mode.clone(),
            path.to_path_buf(),
            inner,
        ))
    }
}

/// Factory handle producing [`DecompressedReader`]s for one mode
#[derive(Debug, Clone)]
pub struct Decompressor {
    mode: Mode,
    codec: Codec,
}

impl Decompressor {
    /// Mode this handle reads
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Open `path` and return a reader yielding its decompressed content
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<DecompressedReader> {
        let path = path.as_ref();
        let inner = (self.codec.decompressor())(path)?;
        Ok(DecompressedReader::new(
            self.mode.clone(),
            path.to_path_buf(),
            inner,
        ))
    }
}

/// Guard returned by [`CompressionRegistry::register_scoped`]
#[derive(Debug)]
pub struct ScopedRegistration<'a> {
    registry: &'a mut CompressionRegistry,
    mode: Mode,
    previous: Option<Codec>,
}

impl ScopedRegistration<'_> {
    /// The temporarily registered mode
    pub fn mode(&self) -> &Mode {
        &self.mode
    }
}

impl Deref for ScopedRegistration<'_> {
    type Target = CompressionRegistry;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl DerefMut for ScopedRegistration<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl Drop for ScopedRegistration<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(codec) => {
                self.registry.codecs.insert(self.mode.clone(), codec);
            }
            None => {
                self.registry.codecs.remove(self.mode.as_str());
            }
        }
        debug!("Restored registry after temporary mode '{}'", self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piglit_types::ErrorKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn mode(name: &str) -> Mode {
        Mode::new(name).unwrap()
    }

    #[test]
    fn test_builtin_modes() {
        let registry = CompressionRegistry::with_builtin();
        let modes: Vec<_> = registry.modes().map(Mode::as_str).collect();
        assert_eq!(modes, vec!["br", "gz", "lz4", "none", "zst"]);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_new_is_empty() {
        let registry = CompressionRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains("none"));
    }

    #[test]
    fn test_unknown_mode() {
        let registry = CompressionRegistry::with_builtin();

        let err = registry.compressor_for("foobar").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMode);

        let err = registry.decompressor_for("foobar").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMode);
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = CompressionRegistry::new();
        assert!(registry.register_codec(mode("foobar"), Codec::none()).is_none());
        assert!(registry.contains("foobar"));
        assert!(registry.compressor_for("foobar").is_ok());
        assert!(registry.decompressor_for("foobar").is_ok());

        assert!(registry.unregister("foobar").is_some());
        assert!(!registry.contains("foobar"));
        assert!(registry.unregister("foobar").is_none());
    }

    #[test]
    fn test_register_closures() {
        let mut registry = CompressionRegistry::new();
        let plain = Codec::none();
        let (c, d) = (plain.compressor().clone(), plain.decompressor().clone());
        registry.register(mode("plain"), move |p| c(p), move |p| d(p));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file");
        registry
            .with_compressor("plain", &path, |w| w.write_str("foo"))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "foo");
    }

    #[test]
    fn test_scoped_registration_removes_new_mode() {
        let mut registry = CompressionRegistry::with_builtin();
        let before: Vec<Mode> = registry.modes().cloned().collect();

        {
            let scoped = registry.register_scoped(mode("foobar"), Codec::none());
            assert!(scoped.contains("foobar"));
            assert_eq!(scoped.mode().as_str(), "foobar");
        }

        let after: Vec<Mode> = registry.modes().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_scoped_registration_restores_displaced_codec() {
        let mut registry = CompressionRegistry::with_builtin();
        let original = registry.get("gz").unwrap().clone();

        {
            let mut scoped = registry.register_scoped(mode("gz"), Codec::none());
            assert!(!scoped.get("gz").unwrap().ptr_eq(&original));
            scoped.unregister("gz");
        }

        assert!(registry.get("gz").unwrap().ptr_eq(&original));
    }

    #[test]
    fn test_scoped_registration_restores_on_panic() {
        let mut registry = CompressionRegistry::with_builtin();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scoped = registry.register_scoped(mode("foobar"), Codec::none());
            panic!("test body failed");
        }));
        assert!(result.is_err());
        assert!(!registry.contains("foobar"));
    }

    #[test]
    fn test_open_write_creates_and_overwrites() {
        let registry = CompressionRegistry::with_builtin();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file");

        for text in ["first write", "foo"] {
            let mut writer = registry.open_write("gz", &path).unwrap();
            writer.write_all(text.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let reader = registry.open_read("gz", &path).unwrap();
        assert_eq!(reader.mode().as_str(), "gz");
        assert_eq!(reader.read_string().unwrap(), "foo");
    }

    #[test]
    fn test_io_errors_propagate() {
        let registry = CompressionRegistry::with_builtin();
        let err = registry.open_read("gz", "/nonexistent/file.gz").unwrap_err();
        match err {
            Error::Io { source } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mode_for_path() {
        let registry = CompressionRegistry::with_builtin();
        assert_eq!(registry.mode_for_path("results.txt.gz").as_str(), "gz");
        assert_eq!(registry.mode_for_path("results.txt.zst").as_str(), "zst");
        assert_eq!(registry.mode_for_path("results.txt").as_str(), "none");
        assert_eq!(registry.mode_for_path("results").as_str(), "none");
        assert_eq!(registry.mode_for_path("results.none").as_str(), "none");
    }

    #[test]
    fn test_compressor_handle_is_detached() {
        let mut registry = CompressionRegistry::with_builtin();
        let compressor = registry.compressor_for("gz").unwrap();
        registry.unregister("gz");

        let temp_dir = TempDir::new().unwrap();
        let mut writer = compressor.open(temp_dir.path().join("file")).unwrap();
        writer.write_all(b"foo").unwrap();
        writer.finish().unwrap();
        assert_eq!(compressor.mode().as_str(), "gz");
    }
}
