//! File backend plumbing
//!
//! A backend writes one small file per test into `<dest>/tests/` while a run is
//! in progress, then combines them into a single results file on finalize. Only
//! the combined file goes through the active compression mode.

use crate::result::TestResult;
use piglit_compression::{CompressedWriter, Compression};
use piglit_types::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directory holding per-test files
pub const TESTS_DIR: &str = "tests";

/// Base name of the combined results file, before extension and suffix
pub const RESULTS_NAME: &str = "results";

const TEMP_SUFFIX: &str = "tmp";

/// State shared by every file backend
#[derive(Debug)]
pub struct BackendCore {
    dest: PathBuf,
    compression: Compression,
    counter: AtomicUsize,
}

impl BackendCore {
    /// Backend rooted at `dest`, numbering test files from zero
    pub fn new<P: Into<PathBuf>>(dest: P, compression: Compression) -> Self {
        Self::with_start_count(dest, compression, 0)
    }

    /// Backend rooted at `dest`, numbering test files from `start`
    ///
    /// Used when resuming a run that already wrote `start` test files.
    pub fn with_start_count<P: Into<PathBuf>>(
        dest: P,
        compression: Compression,
        start: usize,
    ) -> Self {
        Self {
            dest: dest.into(),
            compression,
            counter: AtomicUsize::new(start),
        }
    }

    /// Results directory
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Active compression context
    pub fn compression(&self) -> &Compression {
        &self.compression
    }

    /// `<dest>/tests`
    pub fn tests_dir(&self) -> PathBuf {
        self.dest.join(TESTS_DIR)
    }

    /// `<dest>/results.<ext>` without the compression suffix
    pub fn results_base(&self, extension: &str) -> PathBuf {
        self.dest.join(format!("{RESULTS_NAME}.{extension}"))
    }

    /// Number of test files written so far, including the start count
    pub fn written(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    fn next_index(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Per-test files with `extension`, ordered by their index
    pub fn test_files(&self, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(self.tests_dir()).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::backend(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }
            let index = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<usize>().ok());
            if let Some(index) = index {
                files.push((index, entry.into_path()));
            }
        }
        files.sort_by_key(|(index, _)| *index);
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Remove the per-test directory
    pub fn remove_tests_dir(&self) -> Result<()> {
        let tests = self.tests_dir();
        if tests.exists() {
            fs::remove_dir_all(&tests)?;
            debug!("Removed {}", tests.display());
        }
        Ok(())
    }
}

/// A backend that stores results as files under a destination directory
pub trait FileBackend {
    /// Shared state
    fn core(&self) -> &BackendCore;

    /// Extension of per-test files and of the results file, without the dot
    fn file_extension(&self) -> &str;

    /// Serialize one test into a per-test file
    fn write_entry(&self, out: &mut dyn Write, name: &str, result: &TestResult) -> Result<()>;

    /// Combine the per-test files into the results file and return its path
    fn finalize(&self) -> Result<PathBuf>;

    /// Results directory
    fn dest(&self) -> &Path {
        self.core().dest()
    }

    /// Active compression context
    fn compression(&self) -> &Compression {
        self.core().compression()
    }

    /// Prepare the destination for a run
    fn initialize(&self) -> Result<()> {
        fs::create_dir_all(self.core().tests_dir())?;
        info!("Writing results to {}", self.dest().display());
        Ok(())
    }

    /// Store one test result as `<dest>/tests/<n>.<ext>`
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// a crash never leaves a truncated test file behind. On failure the
    /// temporary file is removed and the index is not reused.
    fn write_test(&self, name: &str, result: &TestResult) -> Result<PathBuf> {
        let core = self.core();
        let index = core.next_index();
        let dir = core.tests_dir();
        let final_path = dir.join(format!("{index}.{}", self.file_extension()));
        let temp_path = dir.join(format!("{index}.{}.{TEMP_SUFFIX}", self.file_extension()));

        let written = write_then_rename(&temp_path, &final_path, |out| {
            self.write_entry(out, name, result)
        });
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
                }
            }
            return Err(e);
        }

        debug!("Wrote test '{}' to {}", name, final_path.display());
        Ok(final_path)
    }

    /// Write `<dest>/results.<ext>` in the active mode through `f`
    fn write_final<F>(&self, f: F) -> Result<PathBuf>
    where
        Self: Sized,
        F: FnOnce(&mut CompressedWriter) -> Result<()>,
    {
        let base = self.core().results_base(self.file_extension());
        let path = self.compression().write_final(base, f)?;
        info!("Results written to {}", path.display());
        Ok(path)
    }
}

fn write_then_rename<F>(temp_path: &Path, final_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let mut out = BufWriter::new(File::create(temp_path)?);
    write(&mut out)?;
    out.into_inner().map_err(io::IntoInnerError::into_error)?;
    fs::rename(temp_path, final_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use piglit_compression::CompressionRegistry;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn core(dir: &Path) -> BackendCore {
        let compression =
            Compression::new(Arc::new(CompressionRegistry::with_builtin()), "none").unwrap();
        BackendCore::new(dir, compression)
    }

    #[test]
    fn test_paths() {
        let core = core(Path::new("/out"));
        assert_eq!(core.tests_dir(), PathBuf::from("/out/tests"));
        assert_eq!(core.results_base("txt"), PathBuf::from("/out/results.txt"));
    }

    #[test]
    fn test_test_files_sorted_numerically() {
        let temp_dir = TempDir::new().unwrap();
        let core = core(temp_dir.path());
        fs::create_dir_all(core.tests_dir()).unwrap();
        for name in ["10.txt", "2.txt", "0.txt", "1.txt.tmp", "notes.txt", "3.json"] {
            fs::write(core.tests_dir().join(name), "x").unwrap();
        }

        let names: Vec<_> = core
            .test_files("txt")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0.txt", "2.txt", "10.txt"]);
    }

    #[test]
    fn test_start_count() {
        let compression =
            Compression::new(Arc::new(CompressionRegistry::with_builtin()), "gz").unwrap();
        let core = BackendCore::with_start_count("/out", compression, 5);
        assert_eq!(core.written(), 5);
        assert_eq!(core.next_index(), 5);
        assert_eq!(core.written(), 6);
    }

    /// Backend whose entries always fail to serialize
    struct RejectingBackend {
        core: BackendCore,
    }

    impl FileBackend for RejectingBackend {
        fn core(&self) -> &BackendCore {
            &self.core
        }

        fn file_extension(&self) -> &str {
            "txt"
        }

        fn write_entry(&self, out: &mut dyn Write, name: &str, _: &TestResult) -> Result<()> {
            write!(out, "{name}: ")?;
            Err(Error::backend(format!("cannot serialize '{name}'")))
        }

        fn finalize(&self) -> Result<PathBuf> {
            Err(Error::backend("nothing to finalize"))
        }
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let backend = RejectingBackend {
            core: core(temp_dir.path()),
        };
        backend.initialize().unwrap();

        let err = backend.write_test("foo", &TestResult::new("pass")).unwrap_err();
        assert!(err.to_string().contains("foo"));
        assert_eq!(backend.core().written(), 1);

        let leftovers: Vec<_> = fs::read_dir(backend.core().tests_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    }

    #[test]
    fn test_remove_missing_tests_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(core(temp_dir.path()).remove_tests_dir().is_ok());
    }
}
