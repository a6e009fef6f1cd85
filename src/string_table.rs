//! Document-wide string deduplication.
//!
//! Every string value and every keyed-container key is stored once in the
//! table at the front of a document and referenced everywhere else by its
//! index. Indices are assigned in first-registration order.
//!
//! The table is written as a `u32` count followed by `(u32 length, UTF-8
//! bytes)` for each entry. How many bytes an index takes depends on the size
//! of the final table, see [`IndexWidth`].

use crate::reader::Reader;
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexSet;

/// Number of bytes used to store one string-table index.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::IndexWidth;
///
/// assert_eq!(IndexWidth::for_len(0).bytes(), 1);
/// assert_eq!(IndexWidth::for_len(256).bytes(), 1);
/// assert_eq!(IndexWidth::for_len(257).bytes(), 2);
/// assert_eq!(IndexWidth::for_len(70_000).bytes(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    One,
    Two,
    Four,
}

impl IndexWidth {
    /// Smallest width able to address every entry of a table with `len`
    /// strings.
    #[must_use]
    pub const fn for_len(len: usize) -> Self {
        if len <= 1 << 8 {
            IndexWidth::One
        } else if len <= 1 << 16 {
            IndexWidth::Two
        } else {
            IndexWidth::Four
        }
    }

    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            IndexWidth::One => 1,
            IndexWidth::Two => 2,
            IndexWidth::Four => 4,
        }
    }

    pub(crate) fn write(self, out: &mut Vec<u8>, index: u32) -> Result<()> {
        match self {
            IndexWidth::One => out.write_u8(index as u8)?,
            IndexWidth::Two => out.write_u16::<LittleEndian>(index as u16)?,
            IndexWidth::Four => out.write_u32::<LittleEndian>(index)?,
        }
        Ok(())
    }
}

/// Encode-side string table.
#[derive(Debug, Clone, Default)]
pub(crate) struct StringTable {
    strings: IndexSet<String>,
}

impl StringTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `s`, appending it on first sight.
    pub(crate) fn register(&mut self, s: &str) -> Result<u32> {
        if let Some(index) = self.strings.get_index_of(s) {
            return u32::try_from(index).map_err(|_| Error::overflow("string table length"));
        }
        let (index, _) = self.strings.insert_full(s.to_string());
        u32::try_from(index).map_err(|_| Error::overflow("string table length"))
    }

    pub(crate) fn index_of(&self, s: &str) -> Option<u32> {
        self.strings
            .get_index_of(s)
            .and_then(|index| u32::try_from(index).ok())
    }

    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn index_width(&self) -> IndexWidth {
        IndexWidth::for_len(self.strings.len())
    }

    pub(crate) fn encoded_len(&self) -> usize {
        4 + self.strings.iter().map(|s| 4 + s.len()).sum::<usize>()
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let count =
            u32::try_from(self.strings.len()).map_err(|_| Error::overflow("string table length"))?;
        out.write_u32::<LittleEndian>(count)?;
        for s in &self.strings {
            let len = u32::try_from(s.len()).map_err(|_| Error::overflow("string length"))?;
            out.write_u32::<LittleEndian>(len)?;
            out.extend_from_slice(s.as_bytes());
        }
        Ok(())
    }
}

/// Decode-side string table borrowing from the input buffer.
///
/// Unlike [`StringTable`] it keeps duplicates as stored: indices in a
/// foreign document refer to positions, not to distinct strings.
#[derive(Debug, Clone, Default)]
pub(crate) struct StringTableView<'de> {
    strings: Vec<&'de str>,
}

impl<'de> StringTableView<'de> {
    pub(crate) fn parse(reader: &mut Reader<'de>) -> Result<Self> {
        let count = reader
            .read_u32()
            .map_err(|_| Error::invalid_string_table("missing string count"))?;

        // Every entry needs at least its length prefix.
        if u64::from(count) * 4 > reader.remaining() as u64 {
            return Err(Error::invalid_string_table(format!(
                "{} strings declared but only {} bytes remain",
                count,
                reader.remaining()
            )));
        }

        let mut strings = Vec::with_capacity(count as usize);
        for position in 0..count {
            let len = reader.read_u32().map_err(|_| {
                Error::invalid_string_table(format!("truncated length of string {}", position))
            })?;
            let bytes = reader.take(len as usize).map_err(|_| {
                Error::invalid_string_table(format!(
                    "string {} declares {} bytes but only {} remain",
                    position,
                    len,
                    reader.remaining()
                ))
            })?;
            let s = std::str::from_utf8(bytes).map_err(|e| {
                Error::invalid_string_table(format!("string {} is not UTF-8: {}", position, e))
            })?;
            strings.push(s);
        }
        Ok(StringTableView { strings })
    }

    pub(crate) fn resolve(&self, index: u32) -> Result<&'de str> {
        self.strings
            .get(index as usize)
            .copied()
            .ok_or(Error::StringIndexOutOfRange {
                index,
                len: self.strings.len(),
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }
}
