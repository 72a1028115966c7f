//! Ingest Error Types
//!
//! The kinds here are the ones surfaced to the caller (usually an HTTP
//! handler mapping them to status codes). Lower-level container errors are
//! kept as children of the error tree for diagnostics.

use cbx_container::error::{Error as ContainerError, ErrorKind as ContainerErrorKind};
use derive_more::{Display, Error};
use std::path::PathBuf;

/// An ingest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The declared file name is not a `.cbz` or `.cbr`.
    #[display("unsupported archive format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The container, or one of its entries, could not be decoded.
    #[display("corrupt archive: {_0}")]
    CorruptArchive(#[error(not(source))] String),
    /// The archive holds no files at all.
    #[display("empty archive: {_0}")]
    EmptyArchive(#[error(not(source))] String),
    /// Writing or renaming a page on disk failed. Pages already in place are
    /// left there.
    #[display("failed to extract pages at {}", _0.display())]
    ExtractionFailed(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Decoding is deterministic; disk failures need an operator.
        false
    }
}

/// Raise a container failure into the matching ingest kind for `file_name`.
#[track_caller]
pub(crate) fn archive_error(err: ContainerError, file_name: &str) -> Error {
    let kind = match &*err {
        ContainerErrorKind::UnsupportedFormat(name) => ErrorKind::UnsupportedFormat(name.clone()),
        _ => ErrorKind::CorruptArchive(file_name.to_string()),
    };
    err.raise(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn test_display() {
        let kind = ErrorKind::ExtractionFailed(PathBuf::from("/srv/pages/0.jpg"));
        assert_eq!(kind.to_string(), "failed to extract pages at /srv/pages/0.jpg");
        assert!(!kind.is_retryable());
    }

    #[test]
    fn test_archive_error_mapping() {
        let unsupported: ContainerError = ContainerErrorKind::UnsupportedFormat("a.pdf".to_string()).into();
        assert_eq!(*archive_error(unsupported, "a.pdf"), ErrorKind::UnsupportedFormat("a.pdf".to_string()));

        let result: cbx_container::error::Result<()> =
            Err(std::io::Error::other("boom")).or_raise(|| ContainerErrorKind::CorruptArchive("001.jpg".to_string()));
        let err = archive_error(result.unwrap_err(), "Saga 01.cbz");
        assert_eq!(*err, ErrorKind::CorruptArchive("Saga 01.cbz".to_string()));
        assert_eq!(err.frame().children().len(), 1);
    }
}
