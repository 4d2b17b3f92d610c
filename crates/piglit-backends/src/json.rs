//! JSON backend

use crate::backend::{BackendCore, FileBackend};
use crate::result::TestResult;
use piglit_compression::{Compression, CompressionRegistry};
use piglit_types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Combined results document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    /// Compression mode the results file was written with
    pub compression: String,
    /// Results keyed by test name
    pub tests: BTreeMap<String, TestResult>,
}

impl TestRun {
    /// Read a results file, detecting its compression from the suffix
    pub fn load<P: AsRef<Path>>(registry: &CompressionRegistry, path: P) -> Result<Self> {
        let path = path.as_ref();
        let mode = registry.mode_for_path(path);
        let reader = registry.open_read(mode.as_str(), path)?;
        serde_json::from_reader(reader).map_err(|e| json_error(path, &e))
    }
}

/// Writes one JSON object per test and a combined `results.json`
#[derive(Debug)]
pub struct JsonBackend {
    core: BackendCore,
}

impl JsonBackend {
    /// Extension used by this backend
    pub const EXTENSION: &'static str = "json";

    /// Backend writing into `dest`
    pub fn new<P: Into<PathBuf>>(dest: P, compression: Compression) -> Self {
        Self {
            core: BackendCore::new(dest, compression),
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, TestResult>> {
        let mut tests = BTreeMap::new();
        for file in self.core.test_files(Self::EXTENSION)? {
            let entry: BTreeMap<String, TestResult> =
                serde_json::from_reader(BufReader::new(File::open(&file)?))
                    .map_err(|e| json_error(&file, &e))?;
            tests.extend(entry);
        }
        debug!("Collected {} test results", tests.len());
        Ok(tests)
    }
}

impl FileBackend for JsonBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    fn file_extension(&self) -> &str {
        Self::EXTENSION
    }

    fn write_entry(&self, out: &mut dyn Write, name: &str, result: &TestResult) -> Result<()> {
        let entry = BTreeMap::from([(name, result)]);
        serde_json::to_writer(out, &entry).map_err(|e| Error::backend(e.to_string()))
    }

    fn finalize(&self) -> Result<PathBuf> {
        let run = TestRun {
            compression: self.compression().mode().to_string(),
            tests: self.read_entries()?,
        };
        let path = self.write_final(|out| {
            serde_json::to_writer_pretty(&mut *out, &run)
                .map_err(|e| Error::backend(e.to_string()))?;
            out.write_all(b"\n")?;
            Ok(())
        })?;
        self.core.remove_tests_dir()?;
        Ok(path)
    }
}

fn json_error(path: &Path, err: &serde_json::Error) -> Error {
    Error::backend(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[rstest]
    #[case("none", "results.json")]
    #[case("gz", "results.json.gz")]
    #[case("zst", "results.json.zst")]
    #[case("br", "results.json.br")]
    fn test_finalize_and_load(#[case] mode: &str, #[case] file_name: &str) {
        let temp_dir = TempDir::new().unwrap();
        let registry = Arc::new(CompressionRegistry::with_builtin());
        let backend =
            JsonBackend::new(temp_dir.path(), Compression::new(Arc::clone(&registry), mode).unwrap());

        backend.initialize().unwrap();
        backend.write_test("foo", &TestResult::new("pass")).unwrap();
        backend
            .write_test("bar", &TestResult::new("crash").with_out("segfault"))
            .unwrap();

        let path = backend.finalize().unwrap();
        assert_eq!(path.file_name().unwrap(), file_name);

        let run = TestRun::load(&registry, &path).unwrap();
        assert_eq!(run.compression, mode);
        assert_eq!(run.tests["foo"], TestResult::new("pass"));
        assert_eq!(run.tests["bar"].out.as_deref(), Some("segfault"));
    }

    #[test]
    fn test_corrupt_entry_is_backend_error() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Arc::new(CompressionRegistry::with_builtin());
        let backend =
            JsonBackend::new(temp_dir.path(), Compression::new(registry, "none").unwrap());
        backend.initialize().unwrap();
        std::fs::write(temp_dir.path().join("tests").join("0.json"), "{not json").unwrap();

        let err = backend.finalize().unwrap_err();
        assert_eq!(err.kind(), piglit_types::ErrorKind::Backend);
        assert!(temp_dir.path().join("tests").exists());
    }
}
