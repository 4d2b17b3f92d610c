//! Unified test utilities for piglit integration tests

use piglit_backends::TestResult;
use piglit_compression::{Codec, CompressionRegistry};
use piglit_config::{PiglitConfig, CONFIG_FILE_NAME};
use piglit_types::{Mode, CONFIG_KEY, CONFIG_SECTION};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::TempDir;

/// Mode name that is never registered by default
pub const FOOBAR_MODE: &str = "foobar";

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Scoped changes to the process environment
///
/// Holds a process-wide lock for its whole lifetime so tests touching the
/// environment never interleave. Every variable changed through the guard is
/// restored on drop, including when the test panics.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Take the environment lock
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Set `key` to `value` until the guard is dropped
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.save(key);
        std::env::set_var(key, value);
        self
    }

    /// Unset `key` until the guard is dropped
    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.save(key);
        std::env::remove_var(key);
        self
    }

    fn save(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Configuration with `[core] compression` set to `mode`, or left unset
pub fn config_with_compression(mode: Option<&str>) -> PiglitConfig {
    let mut config = PiglitConfig::new();
    if let Some(mode) = mode {
        config.set(CONFIG_SECTION, CONFIG_KEY, mode);
    }
    config
}

/// Write a `piglit.conf` into `temp_dir` and return its path
pub fn write_piglit_conf(temp_dir: &TempDir, mode: Option<&str>) -> PathBuf {
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    let mut contents = format!("[{CONFIG_SECTION}]\n");
    if let Some(mode) = mode {
        contents.push_str(&format!("{CONFIG_KEY}={mode}\n"));
    }
    contents.push_str("\n[monitored]\nabort_on_monitored_error=false\n");
    fs::write(&path, contents).expect("Failed to write piglit.conf");
    path
}

/// The `foobar` mode
pub fn foobar_mode() -> Mode {
    Mode::new(FOOBAR_MODE).expect("foobar is a valid mode name")
}

/// Built-in registry plus a pass-through `foobar` mode
pub fn registry_with_foobar() -> CompressionRegistry {
    let mut registry = CompressionRegistry::with_builtin();
    registry.register_codec(foobar_mode(), Codec::none());
    registry
}

/// Names of the registered modes, in order
pub fn mode_names(registry: &CompressionRegistry) -> Vec<String> {
    registry.modes().map(ToString::to_string).collect()
}

/// Deterministic set of test results
pub fn sample_results(count: usize) -> Vec<(String, TestResult)> {
    const STATUSES: [&str; 4] = ["pass", "fail", "skip", "crash"];
    (0..count)
        .map(|i| {
            (
                format!("spec/group-{}/test-{i}", i % 3),
                TestResult::new(STATUSES[i % STATUSES.len()]),
            )
        })
        .collect()
}
