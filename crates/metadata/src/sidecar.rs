//! `ComicInfo.xml` sidecar decoding.
//!
//! Sidecars frequently come from tools that write legacy single-byte
//! encodings, so the raw bytes are transcoded before parsing:
//!
//! 1. A byte order mark, if present, decides the encoding.
//! 2. Otherwise the `encoding` pseudo-attribute of the XML declaration, looked
//!    up as a WHATWG label (`latin1`, `windows-1252`, `shift_jis`, ...).
//! 3. Otherwise UTF-8.
//!
//! Byte sequences that are invalid in the chosen encoding become U+FFFD
//! rather than failing the whole document.

use crate::consts::XML_ENCODING_REGEX;
use crate::error::{ErrorKind, Result};
use crate::models::SidecarRecord;
use encoding_rs::{Encoding, UTF_8};
use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::borrow::Cow;
use tracing::instrument;

const ROOT_ELEMENT: &[u8] = b"ComicInfo";

/// Parse a sidecar document into its raw field values.
///
/// Only direct children of the `ComicInfo` root are read; unknown elements
/// are ignored and repeated elements keep their last value. Anything after
/// the root element closes is not inspected.
///
/// # Errors
///
/// [`ErrorKind::MalformedSidecar`] if the declared charset is unknown, the
/// XML is not well-formed, or the root element is missing or not
/// `ComicInfo`. A well-formed document without any recognised fields is
/// *not* an error.
#[instrument(level = "debug", skip(xml), fields(xml_size = xml.as_ref().len()))]
pub fn parse(xml: impl AsRef<[u8]>) -> Result<SidecarRecord> {
    let text = decode(xml.as_ref())?;
    let mut reader = Reader::from_str(&text);
    let mut record = SidecarRecord::default();
    let mut depth: usize = 0;
    let mut root_seen = false;
    // Recognised field currently open at depth 1.
    let mut field: Option<Vec<u8>> = None;

    loop {
        let event = reader
            .read_event()
            .or_raise(|| ErrorKind::MalformedSidecar(format!("invalid XML near byte {}", reader.error_position())))?;
        match event {
            Event::Start(element) => {
                let name = element.local_name();
                match depth {
                    0 => open_root(name.as_ref(), &mut root_seen)?,
                    1 => {
                        field = record.field_mut(name.as_ref()).map(|slot| {
                            slot.clear();
                            name.as_ref().to_vec()
                        });
                    },
                    _ => {},
                }
                depth += 1;
            },
            Event::Empty(element) => {
                let name = element.local_name();
                match depth {
                    0 => {
                        open_root(name.as_ref(), &mut root_seen)?;
                        return Ok(record);
                    },
                    1 => {
                        if let Some(slot) = record.field_mut(name.as_ref()) {
                            slot.clear();
                        }
                    },
                    _ => {},
                }
            },
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                match depth {
                    0 if root_seen => return Ok(record),
                    1 => field = None,
                    _ => {},
                }
            },
            Event::Text(content) if depth == 2 => {
                if let Some(slot) = field.as_deref().and_then(|name| record.field_mut(name)) {
                    let content = content
                        .unescape()
                        .or_raise(|| ErrorKind::MalformedSidecar("invalid character reference".to_string()))?;
                    slot.push_str(&content);
                }
            },
            Event::CData(content) if depth == 2 => {
                if let Some(slot) = field.as_deref().and_then(|name| record.field_mut(name)) {
                    let content =
                        content.decode().or_raise(|| ErrorKind::MalformedSidecar("undecodable CDATA".to_string()))?;
                    slot.push_str(&content);
                }
            },
            Event::Eof if root_seen => {
                exn::bail!(ErrorKind::MalformedSidecar("unexpected end of document".to_string()))
            },
            Event::Eof => exn::bail!(ErrorKind::MalformedSidecar("no root element".to_string())),
            _ => {},
        }
    }
}

fn open_root(name: &[u8], root_seen: &mut bool) -> Result<()> {
    if name != ROOT_ELEMENT {
        exn::bail!(ErrorKind::MalformedSidecar(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(name)
        )));
    }
    *root_seen = true;
    Ok(())
}

/// Transcode raw sidecar bytes to text.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return Ok(text);
    }
    let encoding = match declared_encoding(bytes) {
        // A UTF-16 label in an ASCII-readable prolog cannot be right; the
        // WHATWG output encoding maps it back to UTF-8.
        Some(label) => Encoding::for_label(label)
            .ok_or_raise(|| {
                ErrorKind::MalformedSidecar(format!("unknown charset {}", String::from_utf8_lossy(label)))
            })?
            .output_encoding(),
        None => UTF_8,
    };
    tracing::trace!(encoding = encoding.name(), "decoding sidecar");
    let (text, malformed) = encoding.decode_without_bom_handling(bytes);
    if malformed {
        tracing::debug!(encoding = encoding.name(), "sidecar contains undecodable bytes");
    }
    Ok(text)
}

fn declared_encoding(bytes: &[u8]) -> Option<&[u8]> {
    XML_ENCODING_REGEX.captures(bytes).and_then(|captures| captures.get(1)).map(|label| label.as_bytes())
}
