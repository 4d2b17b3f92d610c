//! Result type alias for piglit compression operations

use crate::Error;

/// Result type alias for piglit compression operations
pub type Result<T> = std::result::Result<T, Error>;
