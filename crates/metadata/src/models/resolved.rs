use super::SidecarRecord;
use crate::number::first_digit_run;

/// Final bibliographic record for one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ResolvedMetadata {
    /// Series title
    pub series_name: String,
    /// Normalised issue number; empty when unknown
    pub number: String,
    /// Work summary (sidecar only)
    pub summary: String,
    /// Publisher (sidecar only)
    pub publisher: String,
    /// Number of page entries (non-directory entries, minus the sidecar)
    pub pages_count: u32,
}

impl ResolvedMetadata {
    /// Assemble the record from a parsed sidecar.
    ///
    /// `Series` takes precedence over `Title` for the series name. The number
    /// is the first digit run of the first non-empty of `Number`, `Issue` and
    /// `Title`; a non-empty field without digits yields an empty number.
    pub fn from_sidecar(record: &SidecarRecord, pages_count: u32) -> Self {
        let series = record.series.trim();
        let title = record.title.trim();
        let number = [record.number.trim(), record.issue.trim(), title]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .map(first_digit_run)
            .unwrap_or_default();
        let series_name = if series.is_empty() { title } else { series };
        Self {
            series_name: series_name.to_string(),
            number,
            summary: record.summary.trim().to_string(),
            publisher: record.publisher.trim().to_string(),
            pages_count,
        }
    }
}
