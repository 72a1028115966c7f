use crate::error::{Error, ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// A supported comic-book container format.
///
/// Detection is by declared file name only; the archive's bytes are never
/// sniffed, so an unsupported upload is rejected before it is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP-based container (.cbz)
    Zip,
    /// RAR-based container (.cbr)
    Rar,
}

impl FromStr for ArchiveFormat {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cbz" | "zip" => Ok(ArchiveFormat::Zip),
            "cbr" | "rar" => Ok(ArchiveFormat::Rar),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}

impl Display for ArchiveFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for ArchiveFormat {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl ArchiveFormat {
    /// Detect the container format from a declared upload name.
    ///
    /// Only `.cbz` and `.cbr` are recognised (case-insensitively); every other
    /// extension, including a missing one, is
    /// [`UnsupportedFormat`](ErrorKind::UnsupportedFormat).
    pub fn from_file_name(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        match Path::new(name).extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
            Some("cbz") => Ok(ArchiveFormat::Zip),
            Some("cbr") => Ok(ArchiveFormat::Rar),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(name.to_string())),
        }
    }

    /// Returns the file extension for this container format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".cbz",
            ArchiveFormat::Rar => ".cbr",
        }
    }

    /// Returns the short name (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Rar => "rar",
        }
    }
}
