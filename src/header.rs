//! Self-describing layout headers.
//!
//! Every value in a document is a header followed by a payload. The header
//! starts with a one-byte [`Tag`] and, for containers, carries enough sizes to
//! slice the payload into one region per child without looking at the
//! children themselves.
//!
//! Scalar headers carry nothing beyond their tag: the width of a scalar is
//! the length of the region its parent hands it.

use crate::reader::Reader;
use crate::string_table::IndexWidth;
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;

/// Deepest container nesting a document may use. The root value is at
/// depth 0 and every container level adds one.
pub const MAX_DEPTH: usize = 128;

/// The discriminant byte at the start of every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Nil = 0x01,
    Signed = 0x02,
    Unsigned = 0x03,
    String = 0x04,
    RegularKeyed = 0x10,
    EquisizeKeyed = 0x11,
    UniformKeyed = 0x12,
    RegularUnkeyed = 0x20,
    EquisizeUnkeyed = 0x21,
    UniformUnkeyed = 0x22,
}

impl Tag {
    #[must_use]
    pub const fn is_keyed(self) -> bool {
        matches!(
            self,
            Tag::RegularKeyed | Tag::EquisizeKeyed | Tag::UniformKeyed
        )
    }

    #[must_use]
    pub const fn is_unkeyed(self) -> bool {
        matches!(
            self,
            Tag::RegularUnkeyed | Tag::EquisizeUnkeyed | Tag::UniformUnkeyed
        )
    }

    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !self.is_keyed() && !self.is_unkeyed()
    }
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        Ok(match byte {
            0x01 => Tag::Nil,
            0x02 => Tag::Signed,
            0x03 => Tag::Unsigned,
            0x04 => Tag::String,
            0x10 => Tag::RegularKeyed,
            0x11 => Tag::EquisizeKeyed,
            0x12 => Tag::UniformKeyed,
            0x20 => Tag::RegularUnkeyed,
            0x21 => Tag::EquisizeUnkeyed,
            0x22 => Tag::UniformUnkeyed,
            other => return Err(Error::UnknownTag(other)),
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Nil => "nil",
            Tag::Signed => "signed",
            Tag::Unsigned => "unsigned",
            Tag::String => "string",
            Tag::RegularKeyed => "regular keyed",
            Tag::EquisizeKeyed => "equisize keyed",
            Tag::UniformKeyed => "uniform keyed",
            Tag::RegularUnkeyed => "regular unkeyed",
            Tag::EquisizeUnkeyed => "equisize unkeyed",
            Tag::UniformUnkeyed => "uniform unkeyed",
        };
        f.write_str(name)
    }
}

/// One entry of a [`RegularKeyedHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyedEntry {
    /// String-table index of the key.
    pub key: u32,
    /// Bytes the entry occupies in the payload, inline header included.
    pub size: u32,
}

/// Keyed container with an explicit size per entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegularKeyedHeader {
    pub entries: Vec<KeyedEntry>,
}

/// Keyed container whose entries all occupy `item_size` bytes.
///
/// With a `subheader` every entry shares that header and `item_size` counts
/// payload bytes only; this is the uniform keyed layout. Without one each
/// entry carries its own header inside its `item_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EquisizeKeyedHeader {
    pub item_size: u32,
    pub subheader: Option<Box<Header>>,
    pub keys: Vec<u32>,
}

/// Sequence with an explicit size per element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegularUnkeyedHeader {
    pub sizes: Vec<u32>,
}

/// Sequence whose elements all occupy `item_size` bytes, headers included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EquisizeUnkeyedHeader {
    pub item_size: u32,
    pub count: u32,
}

/// Sequence whose elements share one header and `item_size` payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformUnkeyedHeader {
    pub item_size: u32,
    pub subheader: Box<Header>,
    pub count: u32,
}

/// Layout descriptor of a value.
///
/// Equality is structural and recursive; two children with equal headers
/// (and equally long payloads) can share a single header in a uniform
/// container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Header {
    Nil,
    Signed,
    Unsigned,
    String,
    RegularKeyed(RegularKeyedHeader),
    EquisizeKeyed(EquisizeKeyedHeader),
    RegularUnkeyed(RegularUnkeyedHeader),
    EquisizeUnkeyed(EquisizeUnkeyedHeader),
    UniformUnkeyed(UniformUnkeyedHeader),
}

const TAG_LEN: usize = 1;
const FIELD_LEN: usize = 4;

impl Header {
    /// The tag this header is written with. Uniform keyed is recognised by
    /// the presence of a shared sub-header, never stored separately.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Header::Nil => Tag::Nil,
            Header::Signed => Tag::Signed,
            Header::Unsigned => Tag::Unsigned,
            Header::String => Tag::String,
            Header::RegularKeyed(_) => Tag::RegularKeyed,
            Header::EquisizeKeyed(header) if header.subheader.is_some() => Tag::UniformKeyed,
            Header::EquisizeKeyed(_) => Tag::EquisizeKeyed,
            Header::RegularUnkeyed(_) => Tag::RegularUnkeyed,
            Header::EquisizeUnkeyed(_) => Tag::EquisizeUnkeyed,
            Header::UniformUnkeyed(_) => Tag::UniformUnkeyed,
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Header::Nil)
    }

    /// Number of children for containers, `None` for scalars.
    #[must_use]
    pub fn child_count(&self) -> Option<usize> {
        match self {
            Header::Nil | Header::Signed | Header::Unsigned | Header::String => None,
            Header::RegularKeyed(h) => Some(h.entries.len()),
            Header::EquisizeKeyed(h) => Some(h.keys.len()),
            Header::RegularUnkeyed(h) => Some(h.sizes.len()),
            Header::EquisizeUnkeyed(h) => Some(h.count as usize),
            Header::UniformUnkeyed(h) => Some(h.count as usize),
        }
    }

    /// Payload bytes a container header declares. Scalars take whatever
    /// region they are given, so they declare nothing.
    #[must_use]
    pub fn payload_len(&self) -> Option<u64> {
        match self {
            Header::Nil => Some(0),
            Header::Signed | Header::Unsigned | Header::String => None,
            Header::RegularKeyed(h) => Some(h.entries.iter().map(|e| u64::from(e.size)).sum()),
            Header::EquisizeKeyed(h) => Some(u64::from(h.item_size) * h.keys.len() as u64),
            Header::RegularUnkeyed(h) => Some(h.sizes.iter().map(|&s| u64::from(s)).sum()),
            Header::EquisizeUnkeyed(h) => Some(u64::from(h.item_size) * u64::from(h.count)),
            Header::UniformUnkeyed(h) => Some(u64::from(h.item_size) * u64::from(h.count)),
        }
    }

    /// Bytes this header occupies when written with key indices of `width`.
    #[must_use]
    pub fn encoded_len(&self, width: IndexWidth) -> usize {
        let w = width.bytes();
        match self {
            Header::Nil | Header::Signed | Header::Unsigned | Header::String => TAG_LEN,
            Header::RegularKeyed(h) => TAG_LEN + FIELD_LEN + h.entries.len() * (w + FIELD_LEN),
            Header::EquisizeKeyed(h) => {
                TAG_LEN
                    + 2 * FIELD_LEN
                    + h.keys.len() * w
                    + h.subheader.as_ref().map_or(0, |sub| sub.encoded_len(width))
            }
            Header::RegularUnkeyed(h) => TAG_LEN + FIELD_LEN + h.sizes.len() * FIELD_LEN,
            Header::EquisizeUnkeyed(_) => TAG_LEN + 2 * FIELD_LEN,
            Header::UniformUnkeyed(h) => TAG_LEN + 2 * FIELD_LEN + h.subheader.encoded_len(width),
        }
    }

    /// Appends the header to `out`.
    pub fn write(&self, out: &mut Vec<u8>, width: IndexWidth) -> Result<()> {
        out.write_u8(self.tag() as u8)?;
        match self {
            Header::Nil | Header::Signed | Header::Unsigned | Header::String => {}
            Header::RegularKeyed(h) => {
                write_count(out, h.entries.len())?;
                for entry in &h.entries {
                    width.write(out, entry.key)?;
                    out.write_u32::<LittleEndian>(entry.size)?;
                }
            }
            Header::EquisizeKeyed(h) => {
                write_count(out, h.keys.len())?;
                out.write_u32::<LittleEndian>(h.item_size)?;
                for &key in &h.keys {
                    width.write(out, key)?;
                }
                if let Some(subheader) = &h.subheader {
                    subheader.write(out, width)?;
                }
            }
            Header::RegularUnkeyed(h) => {
                write_count(out, h.sizes.len())?;
                for &size in &h.sizes {
                    out.write_u32::<LittleEndian>(size)?;
                }
            }
            Header::EquisizeUnkeyed(h) => {
                out.write_u32::<LittleEndian>(h.count)?;
                out.write_u32::<LittleEndian>(h.item_size)?;
            }
            Header::UniformUnkeyed(h) => {
                out.write_u32::<LittleEndian>(h.count)?;
                out.write_u32::<LittleEndian>(h.item_size)?;
                h.subheader.write(out, width)?;
            }
        }
        Ok(())
    }

    /// Parses one header from the front of `reader`. `depth` is the nesting
    /// level of the value the header describes.
    pub(crate) fn parse(reader: &mut Reader<'_>, width: IndexWidth, depth: usize) -> Result<Header> {
        if depth > MAX_DEPTH {
            return Err(Error::NestingTooDeep(MAX_DEPTH));
        }
        let tag = Tag::try_from(reader.read_u8()?)?;
        let header = match tag {
            Tag::Nil => Header::Nil,
            Tag::Signed => Header::Signed,
            Tag::Unsigned => Header::Unsigned,
            Tag::String => Header::String,
            Tag::RegularKeyed => {
                let count = read_count(reader, width.bytes() + FIELD_LEN)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = reader.read_index(width)?;
                    let size = reader.read_u32()?;
                    entries.push(KeyedEntry { key, size });
                }
                Header::RegularKeyed(RegularKeyedHeader { entries })
            }
            Tag::EquisizeKeyed | Tag::UniformKeyed => {
                let count = reader.read_u32()?;
                let item_size = reader.read_u32()?;
                ensure_fits(reader, count, width.bytes())?;
                let mut keys = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    keys.push(reader.read_index(width)?);
                }
                let subheader = if tag == Tag::UniformKeyed {
                    Some(Box::new(Header::parse(reader, width, depth + 1)?))
                } else {
                    None
                };
                Header::EquisizeKeyed(EquisizeKeyedHeader {
                    item_size,
                    subheader,
                    keys,
                })
            }
            Tag::RegularUnkeyed => {
                let count = read_count(reader, FIELD_LEN)?;
                let mut sizes = Vec::with_capacity(count);
                for _ in 0..count {
                    sizes.push(reader.read_u32()?);
                }
                Header::RegularUnkeyed(RegularUnkeyedHeader { sizes })
            }
            Tag::EquisizeUnkeyed => {
                let count = reader.read_u32()?;
                let item_size = reader.read_u32()?;
                Header::EquisizeUnkeyed(EquisizeUnkeyedHeader { item_size, count })
            }
            Tag::UniformUnkeyed => {
                let count = reader.read_u32()?;
                let item_size = reader.read_u32()?;
                let subheader = Box::new(Header::parse(reader, width, depth + 1)?);
                Header::UniformUnkeyed(UniformUnkeyedHeader {
                    item_size,
                    subheader,
                    count,
                })
            }
        };
        Ok(header)
    }

    /// Short human-readable description used in error messages.
    pub(crate) fn describe(&self, payload_len: usize) -> String {
        match self {
            Header::Signed | Header::Unsigned => format!("{} {}-byte scalar", self.tag(), payload_len),
            Header::Nil | Header::String => self.tag().to_string(),
            _ => format!("{} container", self.tag()),
        }
    }
}

fn write_count(out: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = u32::try_from(count).map_err(|_| Error::overflow("child count"))?;
    out.write_u32::<LittleEndian>(count)?;
    Ok(())
}

/// Reads a count and checks that `count` fields of `field_len` bytes can
/// still follow before anything is allocated for them.
fn read_count(reader: &mut Reader<'_>, field_len: usize) -> Result<usize> {
    let count = reader.read_u32()?;
    ensure_fits(reader, count, field_len)?;
    Ok(count as usize)
}

fn ensure_fits(reader: &Reader<'_>, count: u32, field_len: usize) -> Result<()> {
    let needed = u64::from(count) * field_len as u64;
    if needed > reader.remaining() as u64 {
        return Err(Error::container_too_small(needed, reader.remaining()));
    }
    Ok(())
}
