//! Page extraction and renumbering.
//!
//! Entries are first written into a hidden staging directory inside the
//! destination, each under its position in the archive, then renamed into the
//! destination as `0.jpg`, `1.jpg`, ... (zero-padded to a common width).
//! Staging inside the destination keeps every rename on one filesystem, and
//! positional staging names mean entries sharing a base name never overwrite
//! each other.

use crate::error::{ErrorKind, Result, archive_error};
use cbx_config::ExtensionPolicy;
use cbx_container::Container;
use cbx_container::error::ErrorKind as ContainerErrorKind;
use cbx_metadata::models::is_sidecar;
use exn::{OptionExt, ResultExt};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::instrument;

const STAGING_PREFIX: &str = ".cbx-staging-";

/// What an extraction wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionManifest {
    /// Page base names, one per written entry, in archive order.
    pub written: Vec<String>,
    /// Final page paths, in page order.
    pub pages: Vec<PathBuf>,
}

/// An entry written into staging.
struct StagedPage {
    base_name: String,
    staged: PathBuf,
}

/// Staging directory that is removed on every exit path; removal failures
/// are logged rather than reported.
struct Staging(Option<TempDir>);

impl Staging {
    fn create_in(destination: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(destination)
            .or_raise(|| ErrorKind::ExtractionFailed(destination.to_path_buf()))?;
        Ok(Self(Some(dir)))
    }

    fn path(&self) -> &Path {
        // Only `Drop` takes the directory out.
        self.0.as_ref().map(TempDir::path).unwrap_or(Path::new(""))
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Some(dir) = self.0.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove staging directory");
            }
        }
    }
}

/// Write every page entry of `container` into `destination`, renamed into
/// sequence.
///
/// The first sidecar entry is left out; every other entry becomes exactly one
/// page. Pages are ordered by base name length, then lexicographically, so
/// `page2.jpg` sorts before `page10.jpg`; equal base names keep archive order.
/// Partial output is not rolled back on failure.
#[instrument(skip(container, policy), fields(format = %container.format(), destination = %destination.display()))]
pub(crate) fn extract(
    container: &mut dyn Container,
    file_name: &str,
    destination: &Path,
    policy: &ExtensionPolicy,
) -> Result<ExtractionManifest> {
    container.rewind().map_err(|e| archive_error(e, file_name))?;
    fs::create_dir_all(destination).or_raise(|| ErrorKind::ExtractionFailed(destination.to_path_buf()))?;
    let staging = Staging::create_in(destination)?;

    let staged = stage(container, file_name, staging.path())?;
    let mut ordered: Vec<&StagedPage> = staged.iter().collect();
    // Stable: equal base names stay in archive order.
    ordered.sort_by(|a, b| {
        a.base_name.chars().count().cmp(&b.base_name.chars().count()).then_with(|| a.base_name.cmp(&b.base_name))
    });

    let width = ordered.len().saturating_sub(1).to_string().len();
    let mut pages = Vec::with_capacity(ordered.len());
    for (index, page) in ordered.into_iter().enumerate() {
        let target = destination.join(format!("{index:0width$}{}", policy.suffix_for(&page.base_name)));
        fs::rename(&page.staged, &target).or_raise(|| ErrorKind::ExtractionFailed(target.clone()))?;
        tracing::debug!(from = %page.base_name, to = %target.display(), "page renamed");
        pages.push(target);
    }
    tracing::debug!(pages = pages.len(), "extraction complete");
    let written = staged.into_iter().map(|page| page.base_name).collect();
    Ok(ExtractionManifest { written, pages })
}

/// Copy every page entry into `staging`, named by its position.
fn stage(container: &mut dyn Container, file_name: &str, staging: &Path) -> Result<Vec<StagedPage>> {
    let mut staged = Vec::new();
    let mut sidecar_skipped = false;
    while let Some(entry) = container.next_entry().map_err(|e| archive_error(e, file_name))? {
        if !sidecar_skipped && is_sidecar(&entry.name) {
            sidecar_skipped = true;
            container.skip_entry().map_err(|e| archive_error(e, file_name))?;
            continue;
        }
        let page = base_name(&entry.name).ok_or_raise(|| ErrorKind::ExtractionFailed(PathBuf::from(&entry.name)))?;
        let path = staging.join(staged.len().to_string());
        let mut file = File::create(&path).or_raise(|| ErrorKind::ExtractionFailed(path.clone()))?;
        match container.copy_entry(&mut file) {
            Ok(_) => {},
            Err(e) if matches!(*e, ContainerErrorKind::Sink) => {
                return Err(e).or_raise(|| ErrorKind::ExtractionFailed(path));
            },
            Err(e) => return Err(archive_error(e, file_name)),
        }
        staged.push(StagedPage { base_name: page.to_string(), staged: path });
    }
    Ok(staged)
}

/// Last segment of an entry name, with either separator. `None` when that
/// segment cannot name a file.
fn base_name(entry_name: &str) -> Option<&str> {
    let base = entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name);
    match base {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}
