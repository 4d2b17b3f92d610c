//! Per-test result records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Status such as `pass`, `fail` or `skip`
    pub result: String,
    /// Captured output, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
}

impl TestResult {
    /// A result with no captured output
    pub fn new<S: Into<String>>(result: S) -> Self {
        Self {
            result: result.into(),
            out: None,
        }
    }

    /// Attach captured output
    pub fn with_out<S: Into<String>>(mut self, out: S) -> Self {
        self.out = Some(out.into());
        self
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}
