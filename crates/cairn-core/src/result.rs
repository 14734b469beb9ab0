//! Result type aliases for Cairn.

use crate::CairnError;

/// A specialized `Result` type for Cairn operations.
pub type CairnResult<T> = Result<T, CairnError>;
