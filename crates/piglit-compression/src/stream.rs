//! Scoped stream resources handed out by the registry
//!
//! A [`CompressedWriter`] owns an encoder writing to a file on disk. The encoder
//! must be finalized for the file to be readable, so the writer finalizes on
//! [`CompressedWriter::finish`] and, if that was never called, when dropped.

use piglit_types::{Mode, Result};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// A writer whose output is only complete once `finish` runs
pub trait FinishWrite: Write + Send {
    /// Flush buffered data, write any trailer and close the underlying file
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Open-for-write handle producing a compressed file
pub struct CompressedWriter {
    inner: Option<Box<dyn FinishWrite>>,
    mode: Mode,
    path: PathBuf,
    bytes_written: u64,
}

impl CompressedWriter {
    /// Wrap an encoder writing `path` in `mode`
    pub fn new(mode: Mode, path: PathBuf, inner: Box<dyn FinishWrite>) -> Self {
        Self {
            inner: Some(inner),
            mode,
            path,
            bytes_written: 0,
        }
    }

    /// Mode the file is written in
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Path of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Uncompressed bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write a string
    pub fn write_str(&mut self, data: &str) -> Result<()> {
        self.write_all(data.as_bytes())?;
        Ok(())
    }

    /// Finalize the file, surfacing any error from the encoder trailer
    pub fn finish(mut self) -> Result<()> {
        if let Some(inner) = self.inner.take() {
            inner.finish()?;
            trace!(
                "Finished {} ({} mode, {} bytes in)",
                self.path.display(),
                self.mode,
                self.bytes_written
            );
        }
        Ok(())
    }

    fn inner_mut(&mut self) -> io::Result<&mut Box<dyn FinishWrite>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("compressed writer already finished"))
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner_mut()?.write(buf)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner_mut()?.flush()
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Err(e) = inner.finish() {
                warn!("Failed to finalize {}: {}", self.path.display(), e);
            }
        }
    }
}

impl fmt::Debug for CompressedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedWriter")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("finished", &self.inner.is_none())
            .finish()
    }
}

/// Open-for-read handle yielding decompressed content
pub struct DecompressedReader {
    inner: Box<dyn Read + Send>,
    mode: Mode,
    path: PathBuf,
}

impl DecompressedReader {
    /// Wrap a decoder reading `path` in `mode`
    pub fn new(mode: Mode, path: PathBuf, inner: Box<dyn Read + Send>) -> Self {
        Self { inner, mode, path }
    }

    /// Mode the file is read in
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Path of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole decompressed content as UTF-8
    pub fn read_string(mut self) -> Result<String> {
        let mut contents = String::new();
        self.inner.read_to_string(&mut contents)?;
        Ok(contents)
    }

    /// Read the whole decompressed content
    pub fn read_bytes(mut self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        self.inner.read_to_end(&mut contents)?;
        Ok(contents)
    }
}

impl Read for DecompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for DecompressedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressedReader")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .finish()
    }
}
