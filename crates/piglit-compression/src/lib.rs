//! Pluggable compression for piglit result files
//!
//! This crate decides how result files are compressed on disk and provides the
//! streams used to write and read them:
//!
//! - **Registry**: [`CompressionRegistry`] maps mode names to compressor and
//!   decompressor factories
//! - **Codecs**: Built-in `none`, `gz`, `zst`, `lz4` and `br` modes
//! - **Resolution**: [`resolve_mode`] picks the active mode from the
//!   environment, `piglit.conf` and the default
//! - **Context**: [`Compression`] carries the active mode to file writers
//!
//! # Examples
//!
//! ```rust
//! use piglit_compression::{resolve_mode, CompressionRegistry, ModeInputs};
//! use piglit_types::ModeSource;
//!
//! let registry = CompressionRegistry::with_builtin();
//!
//! let resolved = resolve_mode(&registry, &ModeInputs::new().with_config("zst"))?;
//! assert_eq!(resolved.mode.as_str(), "zst");
//! assert_eq!(resolved.source, ModeSource::Config);
//!
//! let resolved = resolve_mode(&registry, &ModeInputs::new())?;
//! assert_eq!(resolved.mode.as_str(), "gz");
//! # Ok::<(), piglit_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod codecs;
pub mod context;
pub mod registry;
pub mod resolver;
pub mod stream;

// Re-export main types
pub use codecs::{Codec, CompressorFactory, DecompressorFactory};
pub use context::{append_suffix, Compression, ModeOverride};
pub use registry::{CompressionRegistry, Compressor, Decompressor, ScopedRegistration};
pub use resolver::{resolve_mode, ModeInputs, ModeResolver, ResolvedMode};
pub use stream::{CompressedWriter, DecompressedReader, FinishWrite};
