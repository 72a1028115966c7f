use crate::error::{ErrorKind, Result};
use crate::{ArchiveFormat, Container, EntryDescriptor};
use exn::ResultExt;
use std::io::Write;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::instrument;
use unrar::{Archive, CursorBeforeFile, CursorBeforeHeader, OpenArchive, Process};

/// Where the underlying decoder's cursor currently sits.
enum Cursor {
    /// Between entries; the next header has not been read.
    BeforeHeader(OpenArchive<Process, CursorBeforeHeader>),
    /// On an entry whose content has not been consumed.
    BeforeFile(OpenArchive<Process, CursorBeforeFile>),
    /// Exhausted, or poisoned by an earlier decoder failure.
    Finished,
}

/// RAR-backed container.
///
/// The decoder is strictly sequential: content must be read (or skipped)
/// before the next header, and going back means reopening the file.
///
/// The decoder only hands out an entry's content whole, so
/// [`copy_entry`](Container::copy_entry) holds the full unpacked entry in
/// memory before writing it to the sink.
pub struct RarContainer {
    path: PathBuf,
    cursor: Cursor,
}

impl RarContainer {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cursor = Self::start(&path)?;
        Ok(Self { path, cursor })
    }

    fn start(path: &Path) -> Result<Cursor> {
        let archive = Archive::new(path)
            .open_for_processing()
            .or_raise(|| ErrorKind::CorruptArchive(format!("cannot open rar archive {}", path.display())))?;
        Ok(Cursor::BeforeHeader(archive))
    }

    fn entry_name(archive: &OpenArchive<Process, CursorBeforeFile>) -> String {
        archive.entry().filename.to_string_lossy().into_owned()
    }
}

impl Container for RarContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn next_entry(&mut self) -> Result<Option<EntryDescriptor>> {
        loop {
            let mut archive = match mem::replace(&mut self.cursor, Cursor::Finished) {
                Cursor::BeforeHeader(archive) => archive,
                Cursor::BeforeFile(archive) => {
                    let name = Self::entry_name(&archive);
                    archive.skip().or_raise(|| ErrorKind::CorruptArchive(name))?
                },
                Cursor::Finished => return Ok(None),
            };
            let Some(entry) = archive
                .read_header()
                .or_raise(|| ErrorKind::CorruptArchive("unreadable rar header".to_string()))?
            else {
                return Ok(None);
            };
            let header = entry.entry();
            if header.is_directory() {
                let name = Self::entry_name(&entry);
                archive = entry.skip().or_raise(|| ErrorKind::CorruptArchive(name))?;
                self.cursor = Cursor::BeforeHeader(archive);
                continue;
            }
            let descriptor = EntryDescriptor {
                name: Self::entry_name(&entry),
                size: u64::try_from(header.unpacked_size).ok(),
            };
            self.cursor = Cursor::BeforeFile(entry);
            return Ok(Some(descriptor));
        }
    }

    fn copy_entry(&mut self, sink: &mut dyn Write) -> Result<u64> {
        let archive = match mem::replace(&mut self.cursor, Cursor::Finished) {
            Cursor::BeforeFile(archive) => archive,
            other => {
                self.cursor = other;
                exn::bail!(ErrorKind::NoCurrentEntry);
            },
        };
        let name = Self::entry_name(&archive);
        // Whole entry in memory; unrar has no chunked read.
        let (content, archive) = archive.read().or_raise(|| ErrorKind::CorruptArchive(name))?;
        self.cursor = Cursor::BeforeHeader(archive);
        sink.write_all(&content).or_raise(|| ErrorKind::Sink)?;
        Ok(content.len() as u64)
    }

    fn skip_entry(&mut self) -> Result<()> {
        let archive = match mem::replace(&mut self.cursor, Cursor::Finished) {
            Cursor::BeforeFile(archive) => archive,
            other => {
                self.cursor = other;
                exn::bail!(ErrorKind::NoCurrentEntry);
            },
        };
        let name = Self::entry_name(&archive);
        self.cursor = Cursor::BeforeHeader(archive.skip().or_raise(|| ErrorKind::CorruptArchive(name))?);
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "reopening rar archive");
        self.cursor = Self::start(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Stored (uncompressed) RAR4 archive holding `Saga 01/` plus
    /// `Saga 01/002.jpg` ("two"), `Saga 01/001.jpg` ("one") and
    /// `Saga 01/ComicInfo.xml`.
    const PAGES: &[u8] = include_bytes!("../tests/fixtures/pages.rar");

    fn fixture(bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn lists_files_in_order_without_directories() {
        let (_dir, path) = fixture(PAGES);
        let mut rar = RarContainer::open(&path).unwrap();
        let names: Vec<_> = rar.list_entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Saga 01/002.jpg", "Saga 01/001.jpg", "Saga 01/ComicInfo.xml"]);
    }

    #[test]
    fn reads_interleaved_with_listing() {
        let (_dir, path) = fixture(PAGES);
        let mut rar = RarContainer::open(&path).unwrap();
        let first = rar.next_entry().unwrap().unwrap();
        assert_eq!(first.size, Some(3));
        assert_eq!(rar.read_entry().unwrap(), b"two");
        // Left unread: advancing skips it.
        rar.next_entry().unwrap().unwrap();
        let sidecar = rar.next_entry().unwrap().unwrap();
        assert_eq!(sidecar.name, "Saga 01/ComicInfo.xml");
        assert!(rar.read_entry().unwrap().starts_with(b"<?xml"));
        assert!(rar.next_entry().unwrap().is_none());
        assert!(rar.next_entry().unwrap().is_none());
    }

    #[test]
    fn content_is_consumed_once() {
        let (_dir, path) = fixture(PAGES);
        let mut rar = RarContainer::open(&path).unwrap();
        assert_eq!(*rar.read_entry().unwrap_err(), ErrorKind::NoCurrentEntry);
        rar.next_entry().unwrap();
        rar.skip_entry().unwrap();
        assert_eq!(*rar.read_entry().unwrap_err(), ErrorKind::NoCurrentEntry);
        assert_eq!(*rar.skip_entry().unwrap_err(), ErrorKind::NoCurrentEntry);
        // The pass continues normally afterwards.
        assert_eq!(rar.next_entry().unwrap().unwrap().name, "Saga 01/001.jpg");
    }

    #[test]
    fn rewind_reopens_from_the_start() {
        let (_dir, path) = fixture(PAGES);
        let mut rar = RarContainer::open(&path).unwrap();
        assert_eq!(rar.list_entries().unwrap().len(), 3);
        rar.rewind().unwrap();
        rar.next_entry().unwrap();
        assert_eq!(rar.read_entry().unwrap(), b"two");
    }

    #[test]
    fn copy_entry_writes_whole_entry() {
        let (_dir, path) = fixture(PAGES);
        let mut rar = RarContainer::open(&path).unwrap();
        let mut sink = Vec::new();
        rar.next_entry().unwrap();
        assert_eq!(rar.copy_entry(&mut sink).unwrap(), 3);
        assert_eq!(sink, b"two");
    }

    #[test]
    fn missing_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let err = RarContainer::open(dir.path().join("missing.cbr")).err().unwrap();
        assert!(matches!(*err, ErrorKind::CorruptArchive(_)));
    }
}
