//! Whole-document encoding and decoding.
//!
//! A document is laid out as
//!
//! ```text
//! [u8 major][u8 minor][string table][root header][root payload]
//! ```
//!
//! Encoding stages the value, registers every string, finalizes the tree
//! bottom-up and writes the three sections. Decoding parses the version and
//! string table eagerly and the root header only; everything below the root
//! is parsed as it is requested.

use crate::context::{CodingPath, DecodeContext, EncodeContext};
use crate::decoder::{Region, ValueDecoder};
use crate::encoder::ValueEncoder;
use crate::header::Header;
use crate::options::BinaryOptions;
use crate::reader::Reader;
use crate::storage::Storage;
use crate::string_table::{StringTable, StringTableView};
use crate::{Error, Result};
use tracing::debug;

pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Runs one encode pass. `stage` writes the root value.
pub(crate) fn encode_document<F>(options: &BinaryOptions, stage: F) -> Result<Vec<u8>>
where
    F: FnOnce(ValueEncoder<'_>) -> Result<()>,
{
    let context = EncodeContext::new(options.metadata.clone());
    let mut root = Storage::Nil;
    stage(ValueEncoder::new(&mut root, &context, CodingPath::default()))?;

    let mut table = StringTable::new();
    root.register_strings(&mut table)?;
    let width = table.index_width();
    let encoded = root.finalize(&table)?;

    let mut out = Vec::with_capacity(2 + table.encoded_len() + encoded.inline_len(width));
    out.push(VERSION_MAJOR);
    out.push(VERSION_MINOR);
    table.write(&mut out)?;
    encoded.write_inline(&mut out, width)?;

    debug!(
        strings = table.len(),
        index_width = width.bytes(),
        root = %encoded.header.tag(),
        bytes = out.len(),
        "encoded document"
    );
    Ok(out)
}

/// Checks the version and parses the string table, returning it with the
/// bytes of the root value.
fn parse_prologue(input: &[u8]) -> Result<(StringTableView<'_>, &[u8])> {
    if input.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut reader = Reader::new(input);
    let version = (reader.read_u8()?, reader.read_u8()?);
    if version != (VERSION_MAJOR, VERSION_MINOR) {
        return Err(Error::UnsupportedVersion {
            major: version.0,
            minor: version.1,
            expected_major: VERSION_MAJOR,
            expected_minor: VERSION_MINOR,
        });
    }
    let strings = StringTableView::parse(&mut reader)?;
    Ok((strings, reader.rest()))
}

/// Runs one decode pass. `read` receives the root decoder.
pub(crate) fn decode_document<'de, T, F>(
    input: &'de [u8],
    options: &BinaryOptions,
    read: F,
) -> Result<T>
where
    F: for<'a> FnOnce(ValueDecoder<'a, 'de>) -> Result<T>,
{
    let (strings, rest) = parse_prologue(input)?;
    let context = DecodeContext::new(strings, options.metadata.clone());
    let region = Region::parse(rest, context.width(), 0)?;
    debug!(
        strings = context.strings().len(),
        index_width = context.width().bytes(),
        root = %region.header().tag(),
        bytes = input.len(),
        "decoding document"
    );
    read(ValueDecoder::new(&context, region, CodingPath::default()))
}

/// Returns the header of the root value without decoding anything else.
///
/// Useful for checking which layout the encoder picked.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::{root_header, to_vec, Tag};
///
/// let bytes = to_vec(&vec![7u32; 100]).unwrap();
/// let header = root_header(&bytes).unwrap();
/// assert_eq!(header.tag(), Tag::UniformUnkeyed);
/// assert_eq!(header.child_count(), Some(100));
/// ```
///
/// # Errors
///
/// Returns the same format errors a full decode would report for the
/// prologue and root header.
pub fn root_header(input: &[u8]) -> Result<Header> {
    let (strings, rest) = parse_prologue(input)?;
    let context = DecodeContext::new(strings, Default::default());
    Ok(Region::parse(rest, context.width(), 0)?.header().clone())
}
