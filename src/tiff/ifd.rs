//! Image File Directory parsing and field value decoding.
//!
//! A directory is a 2-byte entry count, that many 12-byte entries
//! (tag, type, count, value-or-offset), and a 4-byte link to the next
//! directory. Values whose total size fits in 4 bytes live in the entry
//! itself; larger ones live at the offset it points to.

use alloc::borrow::Cow;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};

use super::reader::TiffReader;
use super::tags::{FieldType, known_tag_name, tag_id, tag_name};
use crate::error::{TiffError, Unsupported};

/// Size of one directory entry in bytes.
pub const IFD_ENTRY_SIZE: usize = 12;

/// Bytes available for an inline value.
const INLINE_THRESHOLD: u64 = 4;

/// Decoded values of one field.
///
/// Numeric types are surfaced as their raw 32-bit patterns: signed values are
/// not sign-extended and FLOAT keeps its IEEE bits. RATIONAL and SRATIONAL
/// elements contribute two values each, numerator then denominator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValues {
    Numbers(Vec<u32>),
    /// ASCII bytes mapped one-to-one to chars, NUL terminators included.
    Ascii(String),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(v) => v.len(),
            Self::Ascii(s) => s.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numbers(&self) -> Option<&[u32]> {
        match self {
            Self::Numbers(v) => Some(v),
            Self::Ascii(_) => None,
        }
    }

    pub fn as_ascii(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) => Some(s),
            Self::Numbers(_) => None,
        }
    }
}

/// One tag entry of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub tag: u16,
    pub field_type: FieldType,
    /// Element count as declared by the entry.
    pub count: u32,
    pub values: FieldValues,
}

impl Entry {
    /// Tag name, or `Tag<id>` for ids outside the known table.
    pub fn name(&self) -> Cow<'static, str> {
        tag_name(self.tag)
    }
}

/// A parsed Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Byte offset the directory was read from.
    pub offset: u32,
    entries: Vec<Entry>,
    /// Offset of the next directory, 0 for the last one.
    pub next_ifd_offset: u32,
}

impl Directory {
    /// Entries in file order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by tag id. A repeated tag resolves to its last entry.
    pub fn get(&self, tag: u16) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| e.tag == tag)
    }

    /// Look up an entry by tag name (`"ImageWidth"`, `"Tag49152"`, ...).
    pub fn get_by_name(&self, name: &str) -> Option<&Entry> {
        self.get(tag_id(name)?)
    }

    pub fn u32s(&self, tag: u16) -> Option<&[u32]> {
        self.get(tag)?.values.as_numbers()
    }

    /// First numeric value of a tag.
    pub fn u32(&self, tag: u16) -> Option<u32> {
        self.u32s(tag)?.first().copied()
    }

    /// ASCII value of a tag with trailing NULs removed.
    pub fn text(&self, tag: u16) -> Option<&str> {
        Some(self.get(tag)?.values.as_ascii()?.trim_end_matches('\0'))
    }

    pub(crate) fn require_u32(&self, tag: u16) -> Result<u32, TiffError> {
        self.u32(tag).ok_or_else(|| missing(tag))
    }

    pub(crate) fn require_u32s(&self, tag: u16) -> Result<&[u32], TiffError> {
        match self.u32s(tag) {
            Some(values) if !values.is_empty() => Ok(values),
            _ => Err(missing(tag)),
        }
    }
}

fn missing(tag: u16) -> TiffError {
    TiffError::MissingTag(known_tag_name(tag).unwrap_or("unknown tag"))
}

/// Follow the directory chain from `first_offset`, returning directories in
/// chain order.
///
/// Fails with [`TiffError::CorruptDirectoryChain`] if an offset repeats or the
/// chain is longer than `max_directories`.
pub fn parse_directories(
    reader: &TiffReader<'_>,
    first_offset: u32,
    max_directories: usize,
) -> Result<Vec<Directory>, TiffError> {
    let mut directories = Vec::new();
    let mut visited = BTreeSet::new();
    let mut offset = first_offset;

    while offset != 0 {
        if !visited.insert(offset) || directories.len() >= max_directories {
            return Err(TiffError::CorruptDirectoryChain { offset });
        }
        let dir = parse_directory(reader, offset)?;
        debug!(
            "IFD #{} at {offset}: {} entries, next at {}",
            directories.len(),
            dir.entries.len(),
            dir.next_ifd_offset
        );
        offset = dir.next_ifd_offset;
        directories.push(dir);
    }

    Ok(directories)
}

/// Parse the single directory at `offset`.
pub fn parse_directory(reader: &TiffReader<'_>, offset: u32) -> Result<Directory, TiffError> {
    let base = offset as usize;
    let num_entries = reader.read_u16(base)? as usize;
    // Bounds-check the whole table up front so a bogus count fails fast.
    reader.slice(base + 2, num_entries * IFD_ENTRY_SIZE + 4)?;

    let mut entries = Vec::with_capacity(num_entries);
    for i in 0..num_entries {
        let at = base + 2 + i * IFD_ENTRY_SIZE;
        let tag = reader.read_u16(at)?;
        let field_type = FieldType::from_u16(reader.read_u16(at + 2)?);
        let count = reader.read_u32(at + 4)?;

        if known_tag_name(tag).is_none() {
            warn!("unknown field tag {tag} retained as {}", tag_name(tag));
        }
        let values = decode_values(reader, field_type, count, at + 8)?;
        entries.push(Entry {
            tag,
            field_type,
            count,
            values,
        });
    }

    let next_ifd_offset = reader.read_u32(base + 2 + num_entries * IFD_ENTRY_SIZE)?;
    Ok(Directory {
        offset,
        entries,
        next_ifd_offset,
    })
}

/// Decode the values of one entry.
///
/// `slot` is the offset of the entry's 4-byte value-or-offset field. When
/// `type width * count` fits in 4 bytes the elements are read from the slot
/// itself, otherwise the slot holds the offset of the out-of-line values.
pub fn decode_values(
    reader: &TiffReader<'_>,
    field_type: FieldType,
    count: u32,
    slot: usize,
) -> Result<FieldValues, TiffError> {
    let Some(width) = field_type.size_in_bytes() else {
        warn!("unknown field type {field_type:?} at offset {slot}; values skipped");
        return Ok(FieldValues::Numbers(Vec::new()));
    };

    let total = width as u64 * u64::from(count);
    let start = if total <= INLINE_THRESHOLD {
        slot
    } else {
        reader.read_u32(slot)? as usize
    };

    if total > INLINE_THRESHOLD && width == 8 && !field_type.is_rational() {
        return Err(Unsupported::FieldType {
            field_type: field_type.name(),
            count,
        }
        .into());
    }

    let bytes = reader.slice(start, total as usize)?;
    if field_type == FieldType::Ascii {
        return Ok(FieldValues::Ascii(bytes.iter().map(|&b| char::from(b)).collect()));
    }

    let mut values = Vec::with_capacity(count as usize * if width == 8 { 2 } else { 1 });
    for i in 0..count as usize {
        let at = start + i * width;
        if field_type.is_rational() {
            values.push(reader.read_u32(at)?);
            values.push(reader.read_u32(at + 4)?);
        } else {
            values.push(reader.read_bytes(width, at)?);
        }
    }
    Ok(FieldValues::Numbers(values))
}
