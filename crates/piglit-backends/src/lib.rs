//! File backends for piglit results
//!
//! Backends write each test result to its own file while a run is in progress
//! and combine them into a single results file at the end. The combined file is
//! written through the active [`piglit_compression::Compression`] context, so it
//! carries the mode suffix (`results.txt.gz`, `results.json.zst`, ...).
//!
//! # Examples
//!
//! ```rust,no_run
//! use piglit_backends::{FileBackend, TestResult, TextBackend};
//! use piglit_compression::{Compression, CompressionRegistry};
//! use std::sync::Arc;
//!
//! let compression = Compression::new(Arc::new(CompressionRegistry::with_builtin()), "gz")?;
//! let backend = TextBackend::new("results", compression);
//!
//! backend.initialize()?;
//! backend.write_test("spec/foo", &TestResult::new("pass"))?;
//! let path = backend.finalize()?;
//! assert!(path.ends_with("results.txt.gz"));
//! # Ok::<(), piglit_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod json;
pub mod result;
pub mod text;

pub use backend::{BackendCore, FileBackend, RESULTS_NAME, TESTS_DIR};
pub use json::{JsonBackend, TestRun};
pub use result::TestResult;
pub use text::TextBackend;
