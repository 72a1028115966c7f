use crate::error::{ErrorKind, Result, archive_error};
use cbx_config::SidecarConfig;
use cbx_container::Container;
use cbx_container::error::ErrorKind as ContainerErrorKind;
use cbx_metadata::models::{ResolvedMetadata, is_sidecar};
use cbx_metadata::{NameResolver, sidecar};
use exn::ResultExt;
use std::io::{Read, Seek, SeekFrom};
use tempfile::SpooledTempFile;
use tracing::instrument;

/// Where the resolved metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataSource {
    /// A `ComicInfo.xml` entry inside the archive.
    Sidecar,
    /// The archive's file name and its first entry's name.
    Heuristic,
}

/// Resolved metadata plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub metadata: ResolvedMetadata,
    pub source: MetadataSource,
}

/// What a single forward pass over the container learned.
struct Survey {
    total: usize,
    first_entry: Option<String>,
    sidecar: Option<SpooledTempFile>,
}

/// Resolve the metadata of `container`, uploaded as `file_name`.
///
/// One forward pass over every entry: the first sidecar is captured, all
/// other entries are skipped. A sidecar that parses wins and is not counted
/// as a page; otherwise (absent, unreadable or malformed) the name heuristics
/// take over and every entry counts as a page.
#[instrument(skip(container, config), fields(format = %container.format()))]
pub(crate) fn resolve(container: &mut dyn Container, file_name: &str, config: &SidecarConfig) -> Result<Resolution> {
    container.rewind().map_err(|e| archive_error(e, file_name))?;
    let survey = survey(container, file_name, config.spool_threshold)?;
    tracing::debug!(entries = survey.total, sidecar = survey.sidecar.is_some(), "archive surveyed");

    let Some(first_entry) = survey.first_entry else {
        exn::bail!(ErrorKind::EmptyArchive(file_name.to_string()));
    };
    let total = u32::try_from(survey.total)
        .or_raise(|| ErrorKind::CorruptArchive(format!("{file_name}: implausible entry count {}", survey.total)))?;

    if let Some(spool) = survey.sidecar {
        match read_sidecar(spool).map(sidecar::parse) {
            Some(Ok(record)) => {
                tracing::debug!("metadata resolved from sidecar");
                return Ok(Resolution {
                    metadata: ResolvedMetadata::from_sidecar(&record, total - 1),
                    source: MetadataSource::Sidecar,
                });
            },
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring malformed sidecar"),
            None => {},
        }
    }

    tracing::debug!(%first_entry, "metadata resolved from names");
    Ok(Resolution {
        metadata: NameResolver::new(file_name).metadata(&first_entry, total),
        source: MetadataSource::Heuristic,
    })
}

fn survey(container: &mut dyn Container, file_name: &str, spool_threshold: usize) -> Result<Survey> {
    let mut survey = Survey { total: 0, first_entry: None, sidecar: None };
    let mut sidecar_seen = false;
    while let Some(entry) = container.next_entry().map_err(|e| archive_error(e, file_name))? {
        survey.total += 1;
        if survey.first_entry.is_none() {
            survey.first_entry = Some(entry.name.clone());
        }
        if sidecar_seen || !is_sidecar(&entry.name) {
            container.skip_entry().map_err(|e| archive_error(e, file_name))?;
            continue;
        }
        sidecar_seen = true;
        tracing::debug!(entry = %entry.name, "sidecar found");
        let mut spool = SpooledTempFile::new(spool_threshold);
        match container.copy_entry(&mut spool) {
            Ok(_) => survey.sidecar = Some(spool),
            // Our own temporary storage failed, not the archive.
            Err(e) if matches!(*e, ContainerErrorKind::Sink) => {
                tracing::warn!(error = %e, entry = %entry.name, "cannot buffer sidecar, ignoring it");
            },
            Err(e) => return Err(archive_error(e, file_name)),
        }
    }
    Ok(survey)
}

/// Read the buffered sidecar back, or `None` if the spool is unreadable.
fn read_sidecar(mut spool: SpooledTempFile) -> Option<Vec<u8>> {
    let mut content = Vec::new();
    match spool.seek(SeekFrom::Start(0)).and_then(|_| spool.read_to_end(&mut content)) {
        Ok(_) => Some(content),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read back buffered sidecar, ignoring it");
            None
        },
    }
}
