//! Comic-book container readers with extension-based format dispatch.
//!
//! Wraps a ZIP decoder and a RAR decoder behind one forward-only
//! [`Container`] interface:
//!
//! - **Format dispatch** from the declared upload name
//!   ([`ArchiveFormat::from_file_name`]); unsupported names are rejected
//!   before any bytes are read.
//! - **Forward pass** over non-directory entries via
//!   [`Container::next_entry`], reading ([`Container::copy_entry`]) or
//!   discarding ([`Container::skip_entry`]) each entry's content in turn.
//! - **Second pass** via [`Container::rewind`]; ZIP reuses its central
//!   directory, RAR reopens the file from the start.
//!
//! The RAR decoder cannot revisit an entry once the cursor has moved past it,
//! so every caller is written against that restriction, even for ZIP.

pub mod error;
mod format;
mod handle;
mod rar;
mod zip;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{self, Read, Write};
use tracing::instrument;

pub use crate::format::ArchiveFormat;
pub use crate::handle::ArchiveHandle;
pub use crate::rar::RarContainer;
pub use crate::zip::ZipContainer;

/// Size of the intermediate buffer used when streaming entry content.
const COPY_BUFFER_SIZE: usize = 8192;

/// Name (and size, when the container records it) of a non-directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub name: String,
    pub size: Option<u64>,
}

/// Forward-only view over a container's non-directory entries.
///
/// Entries are visited in container order. Each entry's content can be
/// consumed at most once, and only while it is the current entry; advancing
/// with [`next_entry`](Self::next_entry) discards whatever was left unread.
pub trait Container {
    fn format(&self) -> ArchiveFormat;

    /// Advance to the next non-directory entry, or `None` once the container
    /// is exhausted.
    fn next_entry(&mut self) -> Result<Option<EntryDescriptor>>;

    /// Stream the current entry's content into `sink`, returning the number of
    /// bytes written.
    ///
    /// ZIP streams in fixed-size chunks. RAR decodes the whole entry into
    /// memory first.
    ///
    /// # Errors
    /// - [`ErrorKind::NoCurrentEntry`] if there is no unread current entry.
    /// - [`ErrorKind::CorruptArchive`] if the content fails to decode.
    /// - [`ErrorKind::Sink`] if `sink` rejects a write.
    fn copy_entry(&mut self, sink: &mut dyn Write) -> Result<u64>;

    /// Explicitly discard the current entry's content.
    fn skip_entry(&mut self) -> Result<()>;

    /// Restart the forward pass from the first entry.
    fn rewind(&mut self) -> Result<()>;

    /// Read the current entry's content into memory.
    fn read_entry(&mut self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.copy_entry(&mut content)?;
        Ok(content)
    }

    /// Drain the remaining entries, discarding their content.
    fn list_entries(&mut self) -> Result<Vec<EntryDescriptor>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            self.skip_entry()?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Open the container behind `handle`, choosing the decoder from the declared
/// file name.
///
/// # Errors
/// - [`ErrorKind::UnsupportedFormat`] for anything other than `.cbz`/`.cbr`;
///   the file is never touched in that case.
/// - [`ErrorKind::CorruptArchive`] if the file cannot be opened or its
///   container header does not parse.
#[instrument(skip(handle), fields(file_name = handle.file_name(), path = %handle.path().display()))]
pub fn open(handle: &ArchiveHandle) -> Result<Box<dyn Container>> {
    let container: Box<dyn Container> = match handle.format()? {
        ArchiveFormat::Zip => Box::new(ZipContainer::open(handle.path())?),
        ArchiveFormat::Rar => Box::new(RarContainer::open(handle.path())?),
    };
    Ok(container)
}

/// Copy `reader` into `sink`, attributing read failures to the archive and
/// write failures to the sink.
fn copy_content(reader: &mut dyn Read, sink: &mut dyn Write, name: &str) -> Result<u64> {
    let mut buffer = vec![0; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;
    loop {
        let bytes = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).or_raise(|| ErrorKind::CorruptArchive(name.to_string())),
        };
        sink.write_all(&buffer[..bytes]).or_raise(|| ErrorKind::Sink)?;
        total = total.saturating_add(bytes as u64);
    }
    Ok(total)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_zip;
    use std::fs::File;

    struct FailingWriter;
    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad block"))
        }
    }

    #[test]
    fn copy_content_counts_bytes() {
        let content = vec![7u8; COPY_BUFFER_SIZE * 2 + 13];
        let mut sink = Vec::new();
        let copied = copy_content(&mut content.as_slice(), &mut sink, "page.jpg").unwrap();
        assert_eq!(copied, content.len() as u64);
        assert_eq!(sink, content);
    }

    #[test]
    fn copy_content_attributes_write_failures_to_sink() {
        let err = copy_content(&mut &b"data"[..], &mut FailingWriter, "page.jpg").unwrap_err();
        assert_eq!(*err, ErrorKind::Sink);
    }

    #[test]
    fn copy_content_attributes_read_failures_to_archive() {
        let err = copy_content(&mut FailingReader, &mut Vec::new(), "page.jpg").unwrap_err();
        assert_eq!(*err, ErrorKind::CorruptArchive("page.jpg".to_string()));
    }

    #[test]
    fn open_rejects_unsupported_extension_without_reading() {
        // The path does not exist: dispatch must fail before touching it.
        let handle = ArchiveHandle::new("/nonexistent/upload", "issue.pdf");
        let err = open(&handle).err().unwrap();
        assert_eq!(*err, ErrorKind::UnsupportedFormat("issue.pdf".to_string()));
    }

    #[test]
    fn open_dispatches_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        write_zip(File::create(&path).unwrap(), &[("001.jpg", b"one")]);
        let mut container = open(&ArchiveHandle::new(&path, "Saga 01.cbz")).unwrap();
        assert_eq!(container.format(), ArchiveFormat::Zip);
        let names: Vec<_> = container.list_entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["001.jpg"]);
    }

    #[test]
    fn open_reports_corrupt_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        let err = open(&ArchiveHandle::new(&path, "Saga 01.cbz")).err().unwrap();
        assert!(matches!(*err, ErrorKind::CorruptArchive(_)));
    }

    #[test]
    fn open_reports_corrupt_rar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        std::fs::write(&path, b"definitely not a rar archive").unwrap();
        // The RAR decoder may defer header validation to the first read.
        let result = open(&ArchiveHandle::new(&path, "Saga 01.cbr")).and_then(|mut c| c.list_entries());
        assert!(matches!(*result.unwrap_err(), ErrorKind::CorruptArchive(_)));
    }
}
