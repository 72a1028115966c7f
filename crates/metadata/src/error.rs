//! Metadata Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only the sidecar parser can fail; the name heuristics
//! always produce *something*, even if it is just the file name.

use derive_more::{Display, Error};

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The sidecar could not be decoded or is not a `ComicInfo` document.
    /// Callers are expected to fall back to the name heuristics.
    #[display("malformed ComicInfo sidecar: {_0}")]
    MalformedSidecar(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The same bytes always parse the same way.
        false
    }
}
