//! Resolve metadata for, and extract pages from, uploaded comic-book archives.
//!
//! One [`Ingest`] per upload, used synchronously and never shared:
//!
//! ```no_run
//! use cbx_config::Config;
//! use cbx_container::ArchiveHandle;
//! use cbx_ingest::Ingestor;
//!
//! # use cbx_metadata::models::ResolvedMetadata;
//! # fn persist(_: &ResolvedMetadata) -> u64 { 42 }
//! # fn main() -> cbx_ingest::error::Result<()> {
//! let ingestor = Ingestor::new(Config::default());
//! let handle = ArchiveHandle::new("/tmp/upload-1f3a", "Saga 01.cbz");
//! let (resolution, manifest) = ingestor.ingest(&handle, |metadata| {
//!     // The persisted record's id keeps destinations unique per upload.
//!     let id = persist(metadata);
//!     format!("/srv/pages/{id}").into()
//! })?;
//! # let _ = (resolution, manifest);
//! # Ok(())
//! # }
//! ```
//!
//! Every operation starts a fresh forward pass over the container, so they
//! can be repeated and combined in any order.

pub mod error;
mod pages;
mod resolve;

use crate::error::{Result, archive_error};
use cbx_config::Config;
use cbx_container::{ArchiveFormat, ArchiveHandle, Container};
use cbx_metadata::models::ResolvedMetadata;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub use crate::pages::ExtractionManifest;
pub use crate::resolve::{MetadataSource, Resolution};

/// Entry point holding the configuration shared by every upload.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    config: Config,
}

impl Ingestor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the archive behind `handle`.
    ///
    /// # Errors
    /// - [`ErrorKind::UnsupportedFormat`](crate::error::ErrorKind::UnsupportedFormat)
    ///   unless the declared name ends in `.cbz` or `.cbr`; nothing is read in
    ///   that case.
    /// - [`ErrorKind::CorruptArchive`](crate::error::ErrorKind::CorruptArchive)
    ///   if the container cannot be opened.
    #[instrument(skip(self, handle), fields(file_name = handle.file_name()))]
    pub fn open(&self, handle: &ArchiveHandle) -> Result<Ingest<'_>> {
        let container = cbx_container::open(handle).map_err(|e| archive_error(e, handle.file_name()))?;
        Ok(Ingest { config: &self.config, file_name: handle.file_name().to_string(), container })
    }

    /// Resolve metadata, ask `destination_for` where the pages go (typically
    /// after persisting the metadata), then extract them there.
    #[instrument(skip(self, handle, destination_for), fields(file_name = handle.file_name()))]
    pub fn ingest(
        &self,
        handle: &ArchiveHandle,
        destination_for: impl FnOnce(&ResolvedMetadata) -> PathBuf,
    ) -> Result<(Resolution, ExtractionManifest)> {
        let mut ingest = self.open(handle)?;
        let resolution = ingest.resolve()?;
        let destination = destination_for(&resolution.metadata);
        let manifest = ingest.extract_to(&destination)?;
        Ok((resolution, manifest))
    }
}

/// An opened upload.
pub struct Ingest<'a> {
    config: &'a Config,
    file_name: String,
    container: Box<dyn Container>,
}

impl Ingest<'_> {
    pub fn format(&self) -> ArchiveFormat {
        self.container.format()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Resolve the archive's metadata, from its sidecar when one parses and
    /// from its names otherwise.
    ///
    /// # Errors
    /// - [`ErrorKind::EmptyArchive`](crate::error::ErrorKind::EmptyArchive)
    ///   if the archive holds no files.
    /// - [`ErrorKind::CorruptArchive`](crate::error::ErrorKind::CorruptArchive)
    ///   if any entry fails to decode.
    pub fn resolve(&mut self) -> Result<Resolution> {
        resolve::resolve(self.container.as_mut(), &self.file_name, &self.config.sidecar)
    }

    /// Extract the pages into `destination` (created if missing) as a
    /// zero-padded sequence.
    ///
    /// # Errors
    /// - [`ErrorKind::ExtractionFailed`](crate::error::ErrorKind::ExtractionFailed)
    ///   if a directory or page cannot be created, written, or renamed. Pages
    ///   already renamed stay in place.
    /// - [`ErrorKind::CorruptArchive`](crate::error::ErrorKind::CorruptArchive)
    ///   if any entry fails to decode.
    pub fn extract_to(&mut self, destination: &Path) -> Result<ExtractionManifest> {
        pages::extract(self.container.as_mut(), &self.file_name, destination, &self.config.extraction.extension)
    }
}
