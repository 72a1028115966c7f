//! Comic-book metadata from `ComicInfo.xml` sidecars and file names.
//!
//! - [`sidecar::parse`] decodes a sidecar (charset-aware) into a
//!   [`SidecarRecord`](models::SidecarRecord).
//! - [`NameResolver`] infers series name and issue number from the archive's
//!   file name and its first entry's name, for archives without a usable
//!   sidecar.
//! - [`normalize`] and [`first_digit_run`] canonicalise issue numbers for
//!   both paths.

mod consts;
pub mod error;
mod heuristic;
pub mod models;
mod number;
pub mod sidecar;

use tracing::instrument;

use crate::error::Result;
pub use crate::heuristic::{
    NameResolver, cross_names, number_after_series, number_from_file_name, series_name_from_file_name,
};
use crate::models::ResolvedMetadata;
pub use crate::number::{first_digit_run, normalize};

/// Easy, top-level entrypoint: parse sidecar bytes straight into a
/// [`ResolvedMetadata`] carrying the given page count.
#[instrument(skip(xml), fields(xml_size = xml.as_ref().len()))]
pub fn from_sidecar(xml: impl AsRef<[u8]>, pages_count: u32) -> Result<ResolvedMetadata> {
    let record = sidecar::parse(xml)?;
    Ok(ResolvedMetadata::from_sidecar(&record, pages_count))
}
