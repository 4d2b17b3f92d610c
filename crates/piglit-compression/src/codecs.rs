//! Built-in codecs
//!
//! Each codec pairs a compressor factory with a decompressor factory. A factory
//! takes a file path and opens it: compressors create (or truncate) the file,
//! decompressors open it for reading.

use crate::stream::FinishWrite;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Opens a file for compressed writing
pub type CompressorFactory =
    Arc<dyn Fn(&Path) -> io::Result<Box<dyn FinishWrite>> + Send + Sync>;

/// Opens a file for decompressed reading
pub type DecompressorFactory = Arc<dyn Fn(&Path) -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

/// Default gzip level
pub const GZ_LEVEL: u32 = 6;
/// Default zstd level
pub const ZSTD_LEVEL: i32 = 3;
/// Default brotli quality
pub const BROTLI_QUALITY: u32 = 6;
/// Brotli window size (log2)
pub const BROTLI_LGWIN: u32 = 22;

const BUFFER_SIZE: usize = 64 * 1024;

/// A compressor/decompressor pair
#[derive(Clone)]
pub struct Codec {
    compressor: CompressorFactory,
    decompressor: DecompressorFactory,
}

impl Codec {
    /// Create a codec from two factory functions
    pub fn new<C, D>(compressor: C, decompressor: D) -> Self
    where
        C: Fn(&Path) -> io::Result<Box<dyn FinishWrite>> + Send + Sync + 'static,
        D: Fn(&Path) -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self {
            compressor: Arc::new(compressor),
            decompressor: Arc::new(decompressor),
        }
    }

    /// The compressor factory
    pub fn compressor(&self) -> &CompressorFactory {
        &self.compressor
    }

    /// The decompressor factory
    pub fn decompressor(&self) -> &DecompressorFactory {
        &self.decompressor
    }

    /// Whether two codecs share the same factories
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.compressor, &other.compressor)
            && Arc::ptr_eq(&self.decompressor, &other.decompressor)
    }

    /// Plain files, no compression
    pub fn none() -> Self {
        Self::new(
            |path| Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?))),
            |path| Ok(Box::new(BufReader::new(File::open(path)?))),
        )
    }

    /// gzip via flate2
    pub fn gz() -> Self {
        Self::new(
            |path| {
                let file = BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?);
                Ok(Box::new(flate2::write::GzEncoder::new(
                    file,
                    flate2::Compression::new(GZ_LEVEL),
                )))
            },
            |path| {
                let file = BufReader::new(File::open(path)?);
                Ok(Box::new(flate2::read::MultiGzDecoder::new(file)))
            },
        )
    }

    /// Zstandard
    pub fn zstd() -> Self {
        Self::new(
            |path| {
                let file = BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?);
                Ok(Box::new(zstd::stream::write::Encoder::new(file, ZSTD_LEVEL)?))
            },
            |path| Ok(Box::new(zstd::stream::read::Decoder::new(File::open(path)?)?)),
        )
    }

    /// LZ4 frame format via lz4_flex
    pub fn lz4() -> Self {
        Self::new(
            |path| {
                let file = BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?);
                Ok(Box::new(lz4_flex::frame::FrameEncoder::new(file)))
            },
            |path| {
                let file = BufReader::new(File::open(path)?);
                Ok(Box::new(lz4_flex::frame::FrameDecoder::new(file)))
            },
        )
    }

    /// Brotli
    pub fn brotli() -> Self {
        Self::new(
            |path| {
                let file = BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?);
                Ok(Box::new(brotli::CompressorWriter::new(
                    ErrorLatch::new(file),
                    4096,
                    BROTLI_QUALITY,
                    BROTLI_LGWIN,
                )))
            },
            |path| Ok(Box::new(brotli::Decompressor::new(File::open(path)?, 4096))),
        )
    }

    /// Names and codecs registered by default
    pub fn builtin() -> Vec<(&'static str, Self)> {
        vec![
            ("none", Self::none()),
            ("gz", Self::gz()),
            ("zst", Self::zstd()),
            ("lz4", Self::lz4()),
            ("br", Self::brotli()),
        ]
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl FinishWrite for BufWriter<File> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let file = (*self).into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }
}

impl FinishWrite for flate2::write::GzEncoder<BufWriter<File>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let inner = flate2::write::GzEncoder::finish(*self)?;
        FinishWrite::finish(Box::new(inner))
    }
}

impl FinishWrite for zstd::stream::write::Encoder<'static, BufWriter<File>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let inner = zstd::stream::write::Encoder::finish(*self)?;
        FinishWrite::finish(Box::new(inner))
    }
}

impl FinishWrite for lz4_flex::frame::FrameEncoder<BufWriter<File>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let inner = lz4_flex::frame::FrameEncoder::finish(*self).map_err(io::Error::other)?;
        FinishWrite::finish(Box::new(inner))
    }
}

impl<W: FinishWrite + 'static> FinishWrite for brotli::CompressorWriter<ErrorLatch<W>> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.flush()?;
        let inner = (*self).into_inner().into_result()?;
        FinishWrite::finish(Box::new(inner))
    }
}

/// Writer that keeps the first error returned by `inner`
///
/// `brotli::CompressorWriter::into_inner` writes the stream trailer but drops
/// any error from doing so. The latch holds on to it for `finish`.
pub struct ErrorLatch<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: Write> ErrorLatch<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    /// The wrapped writer, or the first error it returned
    pub fn into_result(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.inner),
        }
    }

    fn latch(&mut self, error: io::Error) -> io::Error {
        if self.error.is_none() && error.kind() != io::ErrorKind::Interrupted {
            self.error = Some(io::Error::new(error.kind(), error.to_string()));
        }
        error
    }
}

impl<W: Write> Write for ErrorLatch<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.latch(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.latch(e))
    }
}
