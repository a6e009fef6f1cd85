//! Staged values.
//!
//! Encoding first builds a tree of [`Storage`] nodes, one per value, that the
//! container encoders write into. Only once the whole tree exists are strings
//! registered and headers chosen: the layout of a container depends on the
//! finished encoding of all of its children, and the width of every string
//! index depends on the final size of the string table.

use crate::layout::{self, Encoded};
use crate::header::{Header, MAX_DEPTH};
use crate::string_table::StringTable;
use crate::{Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum Storage {
    #[default]
    Nil,
    String(String),
    /// Little-endian two's-complement bytes, 1 to 16 wide.
    Signed(Vec<u8>),
    Unsigned(Vec<u8>),
    Keyed(IndexMap<String, Storage>),
    Unkeyed(Vec<Storage>),
}

impl Storage {
    /// Adds every key and string value of the tree to `table`. Keys of a
    /// container are registered before the values below it.
    pub(crate) fn register_strings(&self, table: &mut StringTable) -> Result<()> {
        match self {
            Storage::Nil | Storage::Signed(_) | Storage::Unsigned(_) => Ok(()),
            Storage::String(s) => table.register(s).map(|_| ()),
            Storage::Keyed(entries) => {
                for key in entries.keys() {
                    table.register(key)?;
                }
                entries
                    .values()
                    .try_for_each(|value| value.register_strings(table))
            }
            Storage::Unkeyed(items) => items
                .iter()
                .try_for_each(|item| item.register_strings(table)),
        }
    }

    /// Converts the tree into a header and payload. Every string must have
    /// been registered in `table` beforehand.
    pub(crate) fn finalize(&self, table: &StringTable) -> Result<Encoded> {
        self.finalize_at(table, 0)
    }

    fn finalize_at(&self, table: &StringTable, depth: usize) -> Result<Encoded> {
        if depth > MAX_DEPTH {
            return Err(Error::Overflow(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }
        let width = table.index_width();
        match self {
            Storage::Nil => Ok(Encoded::nil()),
            Storage::String(s) => {
                let mut payload = Vec::with_capacity(width.bytes());
                width.write(&mut payload, lookup(table, s)?)?;
                Ok(Encoded::scalar(Header::String, payload))
            }
            Storage::Signed(bytes) => Ok(Encoded::scalar(Header::Signed, bytes.clone())),
            Storage::Unsigned(bytes) => Ok(Encoded::scalar(Header::Unsigned, bytes.clone())),
            Storage::Keyed(entries) => {
                let children = entries
                    .iter()
                    .map(|(key, value)| Ok((lookup(table, key)?, value.finalize_at(table, depth + 1)?)))
                    .collect::<Result<Vec<_>>>()?;
                layout::select_keyed(&children, width)
            }
            Storage::Unkeyed(items) => {
                let children = items
                    .iter()
                    .map(|item| item.finalize_at(table, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                layout::select_unkeyed(&children, width)
            }
        }
    }

    /// Turns this slot into a keyed container, keeping existing entries if it
    /// already is one.
    pub(crate) fn make_keyed(&mut self) -> &mut IndexMap<String, Storage> {
        if !matches!(self, Storage::Keyed(_)) {
            *self = Storage::Keyed(IndexMap::new());
        }
        match self {
            Storage::Keyed(entries) => entries,
            _ => unreachable!("slot was just made keyed"),
        }
    }

    /// Turns this slot into a sequence, keeping existing elements if it
    /// already is one.
    pub(crate) fn make_unkeyed(&mut self) -> &mut Vec<Storage> {
        if !matches!(self, Storage::Unkeyed(_)) {
            *self = Storage::Unkeyed(Vec::new());
        }
        match self {
            Storage::Unkeyed(items) => items,
            _ => unreachable!("slot was just made unkeyed"),
        }
    }
}

fn lookup(table: &StringTable, s: &str) -> Result<u32> {
    table
        .index_of(s)
        .ok_or_else(|| Error::custom(format!("string {:?} missing from the string table", s)))
}
