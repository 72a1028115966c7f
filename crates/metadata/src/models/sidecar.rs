/// Raw field values of a `ComicInfo.xml` sidecar.
///
/// Missing elements are empty strings. Values are kept exactly as decoded
/// (untrimmed); see [`ResolvedMetadata::from_sidecar`](super::ResolvedMetadata::from_sidecar).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SidecarRecord {
    pub title: String,
    pub number: String,
    pub issue: String,
    pub series: String,
    pub publisher: String,
    pub summary: String,
}

impl SidecarRecord {
    /// Slot for a recognised child element of the root, if any.
    pub(crate) fn field_mut(&mut self, element: &[u8]) -> Option<&mut String> {
        Some(match element {
            b"Title" => &mut self.title,
            b"Number" => &mut self.number,
            b"Issue" => &mut self.issue,
            b"Series" => &mut self.series,
            b"Publisher" => &mut self.publisher,
            b"Summary" => &mut self.summary,
            _ => return None,
        })
    }
}

/// Whether an entry name designates a sidecar: its lowercased form contains
/// `comicinfo.xml` anywhere.
pub fn is_sidecar(entry_name: &str) -> bool {
    entry_name.to_lowercase().contains(crate::consts::SIDECAR_TOKEN)
}
