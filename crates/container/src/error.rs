//! Container Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A container error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The declared file name does not carry a supported container extension.
    /// Nothing has been read from the archive.
    #[display("unsupported archive format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The container header or an entry's content could not be decoded.
    /// Don't retry with the same input.
    #[display("corrupt archive: {_0}")]
    CorruptArchive(#[error(not(source))] String),
    /// Entry content was requested without a current entry, or after the
    /// current entry's content had already been consumed.
    #[display("no entry content is available to read")]
    NoCurrentEntry,
    /// Writing entry content into the caller's writer failed. The archive
    /// itself decoded fine.
    #[display("failed to write entry content")]
    Sink,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Archive decoding is deterministic; the same bytes fail the same way.
        false
    }
}
