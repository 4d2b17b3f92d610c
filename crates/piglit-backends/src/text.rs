//! Line-oriented text backend

use crate::backend::{BackendCore, FileBackend};
use crate::result::TestResult;
use piglit_compression::Compression;
use piglit_types::Result;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Writes `name: result` lines to `results.txt`
#[derive(Debug)]
pub struct TextBackend {
    core: BackendCore,
}

impl TextBackend {
    /// Extension used by this backend
    pub const EXTENSION: &'static str = "txt";

    /// Backend writing into `dest`
    pub fn new<P: Into<PathBuf>>(dest: P, compression: Compression) -> Self {
        Self {
            core: BackendCore::new(dest, compression),
        }
    }

    /// Backend over an existing run in `dest`, continuing its numbering
    pub fn resume<P: Into<PathBuf>>(dest: P, compression: Compression) -> Result<Self> {
        let dest = dest.into();
        let scan = BackendCore::new(&dest, compression.clone());
        let start = scan
            .test_files(Self::EXTENSION)?
            .iter()
            .filter_map(|p| p.file_stem()?.to_str()?.parse::<usize>().ok())
            .max()
            .map_or(0, |last| last + 1);

        Ok(Self {
            core: BackendCore::with_start_count(dest, compression, start),
        })
    }
}

impl FileBackend for TextBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    fn file_extension(&self) -> &str {
        Self::EXTENSION
    }

    fn write_entry(&self, out: &mut dyn Write, name: &str, result: &TestResult) -> Result<()> {
        writeln!(out, "{name}: {result}")?;
        Ok(())
    }

    fn finalize(&self) -> Result<PathBuf> {
        let files = self.core.test_files(Self::EXTENSION)?;
        let path = self.write_final(|out| {
            for file in &files {
                io::copy(&mut File::open(file)?, out)?;
            }
            Ok(())
        })?;
        self.core.remove_tests_dir()?;
        Ok(path)
    }
}
