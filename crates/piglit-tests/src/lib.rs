//! Shared test utilities for the piglit compression crates
//!
//! The integration suites under `tests/` exercise the crates together,
//! including resolution from the real process environment.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Environment guards, configuration fixtures and result generators used
/// across the integration suites.
pub mod test_utils;
