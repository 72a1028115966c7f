use crate::error::{ErrorKind, Result};
use crate::{ArchiveFormat, Container, EntryDescriptor, copy_content};
use exn::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;

/// ZIP-backed container.
///
/// The central directory is read once when the container is opened, so
/// rewinding is just a matter of resetting the cursor.
pub struct ZipContainer<R: Read + Seek = BufReader<File>> {
    archive: ZipArchive<R>,
    /// Index of the next central directory record to inspect.
    cursor: usize,
    /// Index of the current entry, while its content is unread.
    current: Option<usize>,
}

impl ZipContainer<BufReader<File>> {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).or_raise(|| ErrorKind::CorruptArchive(format!("cannot open {}", path.display())))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipContainer<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .or_raise(|| ErrorKind::CorruptArchive("unreadable zip central directory".to_string()))?;
        tracing::debug!(records = archive.len(), "zip central directory loaded");
        Ok(Self { archive, cursor: 0, current: None })
    }

    fn entry_name(&self, index: usize) -> String {
        self.archive.name_for_index(index).unwrap_or_default().to_string()
    }
}

impl<R: Read + Seek> Container for ZipContainer<R> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn next_entry(&mut self) -> Result<Option<EntryDescriptor>> {
        // Random access: leaving the previous entry unread costs nothing.
        self.current = None;
        while self.cursor < self.archive.len() {
            let index = self.cursor;
            self.cursor += 1;
            let file = self
                .archive
                .by_index_raw(index)
                .or_raise(|| ErrorKind::CorruptArchive(format!("unreadable zip record #{index}")))?;
            if file.is_dir() {
                continue;
            }
            let descriptor = EntryDescriptor { name: file.name().to_string(), size: Some(file.size()) };
            self.current = Some(index);
            return Ok(Some(descriptor));
        }
        Ok(None)
    }

    fn copy_entry(&mut self, sink: &mut dyn Write) -> Result<u64> {
        let index = self.current.take().ok_or_raise(|| ErrorKind::NoCurrentEntry)?;
        let name = self.entry_name(index);
        let mut file = self.archive.by_index(index).or_raise(|| ErrorKind::CorruptArchive(name.clone()))?;
        copy_content(&mut file, sink, &name)
    }

    fn skip_entry(&mut self) -> Result<()> {
        self.current.take().ok_or_raise(|| ErrorKind::NoCurrentEntry)?;
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        self.current = None;
        Ok(())
    }
}
