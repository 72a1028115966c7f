use crate::ArchiveFormat;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// An uploaded archive: where its bytes live on disk, plus the name it was
/// uploaded under.
///
/// The declared name drives format dispatch and feeds the name heuristics;
/// it frequently differs from the on-disk name (temporary upload files).
/// The file itself is reopened from the start for every forward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    path: PathBuf,
    file_name: String,
}

impl ArchiveHandle {
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self { path: path.into(), file_name: file_name.into() }
    }

    /// Use the final component of `path` as the declared name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Container format implied by the declared name.
    pub fn format(&self) -> Result<ArchiveFormat> {
        ArchiveFormat::from_file_name(&self.file_name)
    }
}
