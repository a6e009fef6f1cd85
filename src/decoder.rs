//! Container API for decoding.
//!
//! A [`ValueDecoder`] wraps one region of the input: a parsed header plus the
//! payload bytes it describes. Keyed and unkeyed decoders slice their payload
//! into child regions from the header alone, and parse a child's header only
//! when that child is requested.

use crate::context::{CodingPath, DecodeContext};
use crate::de::Deserializer;
use crate::header::{Header, Tag};
use crate::options::Metadata;
use crate::reader::Reader;
use crate::string_table::IndexWidth;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexMap;
use serde::Deserialize;

/// A value that knows how to read itself through the container API.
pub trait Decode<'de>: Sized {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self>;
}

/// A header and the payload bytes it owns.
#[derive(Debug, Clone)]
pub(crate) struct Region<'de> {
    header: Header,
    payload: &'de [u8],
}

impl<'de> Region<'de> {
    /// Parses a region that carries its own header. An empty region is nil.
    pub(crate) fn parse(bytes: &'de [u8], width: IndexWidth, depth: usize) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Region {
                header: Header::Nil,
                payload: bytes,
            });
        }
        let mut reader = Reader::new(bytes);
        let header = Header::parse(&mut reader, width, depth)?;
        Region::with_header(header, reader.rest())
    }

    /// Pairs a known header with the bytes after it. Containers must fit in
    /// `available`; scalars take all of it.
    pub(crate) fn with_header(header: Header, available: &'de [u8]) -> Result<Self> {
        let payload = match header.payload_len() {
            Some(len) if len > available.len() as u64 => {
                return Err(Error::container_too_small(len, available.len()));
            }
            Some(len) => &available[..len as usize],
            None => available,
        };
        Ok(Region { header, payload })
    }

    pub(crate) fn header(&self) -> &Header {
        &self.header
    }
}

/// Child regions of a container payload.
#[derive(Debug)]
enum Slots<'de> {
    /// One slice per child, cut from per-child sizes.
    Sized(Vec<&'de [u8]>),
    /// `count` back-to-back children of `item_size` bytes each.
    Fixed {
        payload: &'de [u8],
        item_size: usize,
        count: usize,
    },
}

impl<'de> Slots<'de> {
    fn sized(payload: &'de [u8], sizes: impl Iterator<Item = u32>) -> Result<Self> {
        let mut reader = Reader::new(payload);
        let slices = sizes
            .map(|size| reader.take(size as usize))
            .collect::<Result<Vec<_>>>()?;
        Ok(Slots::Sized(slices))
    }

    fn len(&self) -> usize {
        match self {
            Slots::Sized(slices) => slices.len(),
            Slots::Fixed { count, .. } => *count,
        }
    }

    fn get(&self, index: usize) -> Option<&'de [u8]> {
        match self {
            Slots::Sized(slices) => slices.get(index).copied(),
            Slots::Fixed {
                payload,
                item_size,
                count,
            } => {
                if index >= *count {
                    return None;
                }
                let start = index.checked_mul(*item_size)?;
                payload.get(start..start.checked_add(*item_size)?)
            }
        }
    }
}

/// Region of a child at `depth`. A shared header was already parsed, and
/// depth checked, together with its parent's.
fn child_region<'de>(
    slice: &'de [u8],
    shared: Option<&Header>,
    width: IndexWidth,
    depth: usize,
) -> Result<Region<'de>> {
    match shared {
        Some(header) => Region::with_header(header.clone(), slice),
        None => Region::parse(slice, width, depth),
    }
}

/// Reads exactly one value.
pub struct ValueDecoder<'a, 'de> {
    context: &'a DecodeContext<'de>,
    region: Region<'de>,
    path: CodingPath,
}

macro_rules! decode_narrowed {
    ($($method:ident: $ty:ty => $wide:ident),* $(,)?) => {
        $(
            pub fn $method(&self) -> Result<$ty> {
                let value = self.$wide(stringify!($ty))?;
                <$ty>::try_from(value).map_err(|_| {
                    Error::type_mismatch(
                        &self.path,
                        stringify!($ty),
                        format!("out-of-range value {}", value),
                    )
                })
            }
        )*
    };
}

impl<'a, 'de> ValueDecoder<'a, 'de> {
    pub(crate) fn new(context: &'a DecodeContext<'de>, region: Region<'de>, path: CodingPath) -> Self {
        ValueDecoder {
            context,
            region,
            path,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Tag {
        self.region.header.tag()
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.region.header
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.region.header.is_nil()
    }

    fn mismatch(&self, expected: &str) -> Error {
        let found = self.region.header.describe(self.region.payload.len());
        Error::type_mismatch(&self.path, expected, found)
    }

    /// Payload of a scalar, checked to have one of the fixed integer widths.
    pub(crate) fn scalar_payload(&self) -> Result<&'de [u8]> {
        match self.region.payload.len() {
            1 | 2 | 4 | 8 | 16 => Ok(self.region.payload),
            other => Err(Error::InvalidScalarWidth(other)),
        }
    }

    fn signed(&self, expected: &str) -> Result<i128> {
        match self.region.header {
            Header::Signed => {
                let bytes = self.scalar_payload()?;
                Ok(LittleEndian::read_int128(bytes, bytes.len()))
            }
            _ => Err(self.mismatch(expected)),
        }
    }

    fn unsigned(&self, expected: &str) -> Result<u128> {
        match self.region.header {
            Header::Unsigned => {
                let bytes = self.scalar_payload()?;
                Ok(LittleEndian::read_uint128(bytes, bytes.len()))
            }
            _ => Err(self.mismatch(expected)),
        }
    }

    decode_narrowed! {
        decode_i8: i8 => signed,
        decode_i16: i16 => signed,
        decode_i32: i32 => signed,
        decode_i64: i64 => signed,
        decode_u8: u8 => unsigned,
        decode_u16: u16 => unsigned,
        decode_u32: u32 => unsigned,
        decode_u64: u64 => unsigned,
    }

    pub fn decode_i128(&self) -> Result<i128> {
        self.signed("i128")
    }

    pub fn decode_u128(&self) -> Result<u128> {
        self.unsigned("u128")
    }

    pub fn decode_bool(&self) -> Result<bool> {
        match (&self.region.header, self.region.payload) {
            (Header::Unsigned, [0]) => Ok(false),
            (Header::Unsigned, [1]) => Ok(true),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn decode_f32(&self) -> Result<f32> {
        match (&self.region.header, self.region.payload.len()) {
            (Header::Unsigned, 4) => Ok(f32::from_bits(LittleEndian::read_u32(self.region.payload))),
            _ => Err(self.mismatch("f32")),
        }
    }

    /// Reads an `f64`, widening a stored `f32`.
    pub fn decode_f64(&self) -> Result<f64> {
        match (&self.region.header, self.region.payload.len()) {
            (Header::Unsigned, 8) => Ok(f64::from_bits(LittleEndian::read_u64(self.region.payload))),
            (Header::Unsigned, 4) => Ok(f64::from(f32::from_bits(LittleEndian::read_u32(
                self.region.payload,
            )))),
            _ => Err(self.mismatch("f64")),
        }
    }

    /// Reads a string, borrowed from the input's string table.
    pub fn decode_str(&self) -> Result<&'de str> {
        match self.region.header {
            Header::String => {
                let index = Reader::new(self.region.payload).read_index(self.context.width())?;
                self.context.strings().resolve(index)
            }
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn decode_char(&self) -> Result<char> {
        let s = self.decode_str()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::type_mismatch(
                &self.path,
                "char",
                format!("string of {} chars", s.chars().count()),
            )),
        }
    }

    /// Reads any `Deserialize` value.
    pub fn decode<T>(self) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        T::deserialize(Deserializer::new(self))
    }

    pub fn decode_with<T>(self) -> Result<T>
    where
        T: Decode<'de>,
    {
        T::decode(self)
    }

    pub fn keyed(self) -> Result<KeyedDecoder<'a, 'de>> {
        KeyedDecoder::new(self)
    }

    pub fn unkeyed(self) -> Result<SeqDecoder<'a, 'de>> {
        SeqDecoder::new(self)
    }

    /// The payload of a uniform sequence of one-byte unsigned scalars.
    pub(crate) fn borrowed_bytes(&self) -> Option<&'de [u8]> {
        match &self.region.header {
            Header::UniformUnkeyed(h) if h.item_size == 1 && *h.subheader == Header::Unsigned => {
                Some(self.region.payload)
            }
            _ => None,
        }
    }

    pub fn metadata(&self) -> &'a Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

/// Random access to the entries of a keyed container.
///
/// When a key occurs more than once the last occurrence wins, keeping the
/// position of the first.
pub struct KeyedDecoder<'a, 'de> {
    context: &'a DecodeContext<'de>,
    entries: IndexMap<&'de str, &'de [u8]>,
    shared: Option<Header>,
    path: CodingPath,
}

impl<'a, 'de> KeyedDecoder<'a, 'de> {
    fn new(decoder: ValueDecoder<'a, 'de>) -> Result<Self> {
        let ValueDecoder {
            context,
            region,
            path,
        } = decoder;
        let strings = context.strings();
        let mut entries = IndexMap::new();
        let shared = match region.header {
            Header::RegularKeyed(header) => {
                let mut reader = Reader::new(region.payload);
                for entry in &header.entries {
                    let key = strings.resolve(entry.key)?;
                    entries.insert(key, reader.take(entry.size as usize)?);
                }
                None
            }
            Header::EquisizeKeyed(header) => {
                let slots = Slots::Fixed {
                    payload: region.payload,
                    item_size: header.item_size as usize,
                    count: header.keys.len(),
                };
                for (position, &key) in header.keys.iter().enumerate() {
                    let slice = slots.get(position).ok_or_else(|| {
                        Error::container_too_small(
                            u64::from(header.item_size) * header.keys.len() as u64,
                            region.payload.len(),
                        )
                    })?;
                    entries.insert(strings.resolve(key)?, slice);
                }
                header.subheader.map(|subheader| *subheader)
            }
            other => {
                return Err(Error::type_mismatch(
                    &path,
                    "keyed container",
                    other.describe(region.payload.len()),
                ))
            }
        };
        Ok(KeyedDecoder {
            context,
            entries,
            shared,
            path,
        })
    }

    fn decoder_for(&self, key: &'de str, slice: &'de [u8]) -> Result<ValueDecoder<'a, 'de>> {
        let path = self.path.key(key);
        let depth = path.segments().len();
        let region = child_region(slice, self.shared.as_ref(), self.context.width(), depth)?;
        Ok(ValueDecoder::new(self.context, region, path))
    }

    pub(crate) fn entry(&self, key: &str) -> Result<ValueDecoder<'a, 'de>> {
        let (&stored, &slice) = self
            .entries
            .get_key_value(key)
            .ok_or_else(|| Error::key_not_found(&self.path, key))?;
        self.decoder_for(stored, slice)
    }

    /// Key and decoder of the entry at `position`, in stored order.
    pub(crate) fn entry_at(&self, position: usize) -> Option<Result<(&'de str, ValueDecoder<'a, 'de>)>> {
        let (&key, &slice) = self.entries.get_index(position)?;
        Some(self.decoder_for(key, slice).map(|decoder| (key, decoder)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct keys in stored order.
    pub fn keys(&self) -> impl Iterator<Item = &'de str> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn decode<T>(&self, key: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        self.entry(key)?.decode()
    }

    pub fn decode_with<T>(&self, key: &str) -> Result<T>
    where
        T: Decode<'de>,
    {
        self.entry(key)?.decode_with()
    }

    /// Whether the entry under `key` is nil.
    pub fn decode_nil(&self, key: &str) -> Result<bool> {
        Ok(self.entry(key)?.is_nil())
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedDecoder<'a, 'de>> {
        self.entry(key)?.keyed()
    }

    pub fn nested_unkeyed(&self, key: &str) -> Result<SeqDecoder<'a, 'de>> {
        self.entry(key)?.unkeyed()
    }

    /// Decoder for the base layer stored under
    /// [`BASE_KEY`](crate::encoder::BASE_KEY).
    pub fn base_layer(&self) -> Result<ValueDecoder<'a, 'de>> {
        self.entry(crate::encoder::BASE_KEY)
    }

    pub fn base_layer_for(&self, key: &str) -> Result<ValueDecoder<'a, 'de>> {
        self.entry(key)
    }

    pub fn metadata(&self) -> &'a Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

/// Sequential access to the elements of a sequence.
pub struct SeqDecoder<'a, 'de> {
    context: &'a DecodeContext<'de>,
    slots: Slots<'de>,
    shared: Option<Header>,
    cursor: usize,
    path: CodingPath,
}

impl<'a, 'de> SeqDecoder<'a, 'de> {
    fn new(decoder: ValueDecoder<'a, 'de>) -> Result<Self> {
        let ValueDecoder {
            context,
            region,
            path,
        } = decoder;
        let (slots, shared) = match region.header {
            Header::RegularUnkeyed(header) => {
                (Slots::sized(region.payload, header.sizes.into_iter())?, None)
            }
            Header::EquisizeUnkeyed(header) => (
                Slots::Fixed {
                    payload: region.payload,
                    item_size: header.item_size as usize,
                    count: header.count as usize,
                },
                None,
            ),
            Header::UniformUnkeyed(header) => (
                Slots::Fixed {
                    payload: region.payload,
                    item_size: header.item_size as usize,
                    count: header.count as usize,
                },
                Some(*header.subheader),
            ),
            other => {
                return Err(Error::type_mismatch(
                    &path,
                    "unkeyed container",
                    other.describe(region.payload.len()),
                ))
            }
        };
        Ok(SeqDecoder {
            context,
            slots,
            shared,
            cursor: 0,
            path,
        })
    }

    fn peek(&self) -> Result<Region<'de>> {
        let slice = self
            .slots
            .get(self.cursor)
            .ok_or_else(|| Error::out_of_range(&self.path, self.cursor, self.slots.len()))?;
        let depth = self.path.segments().len() + 1;
        child_region(slice, self.shared.as_ref(), self.context.width(), depth)
    }

    fn next(&mut self) -> Result<ValueDecoder<'a, 'de>> {
        let region = self.peek()?;
        let path = self.path.index(self.cursor);
        self.cursor += 1;
        Ok(ValueDecoder::new(self.context, region, path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    /// Position of the next element to be read.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.slots.len()
    }

    pub fn decode<T>(&mut self) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        self.next()?.decode()
    }

    pub fn decode_with<T>(&mut self) -> Result<T>
    where
        T: Decode<'de>,
    {
        self.next()?.decode_with()
    }

    /// Consumes the next element only if it is nil.
    pub fn decode_nil(&mut self) -> Result<bool> {
        let nil = self.is_next_nil()?;
        if nil {
            self.cursor += 1;
        }
        Ok(nil)
    }

    /// Whether the next element is nil, without consuming it.
    pub fn is_next_nil(&self) -> Result<bool> {
        Ok(self.peek()?.header.is_nil())
    }

    pub fn nested_keyed(&mut self) -> Result<KeyedDecoder<'a, 'de>> {
        self.next()?.keyed()
    }

    pub fn nested_unkeyed(&mut self) -> Result<SeqDecoder<'a, 'de>> {
        self.next()?.unkeyed()
    }

    /// Decoder for a base layer stored as the next element.
    pub fn base_layer(&mut self) -> Result<ValueDecoder<'a, 'de>> {
        self.next()
    }

    pub(crate) fn next_decoder(&mut self) -> Option<Result<ValueDecoder<'a, 'de>>> {
        if self.is_at_end() {
            None
        } else {
            Some(self.next())
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.slots.len().saturating_sub(self.cursor)
    }

    pub fn metadata(&self) -> &'a Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

impl<'de, T: Decode<'de>> Decode<'de> for Box<T> {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        T::decode(decoder).map(Box::new)
    }
}

impl<'de, T: Decode<'de>> Decode<'de> for Option<T> {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        if decoder.is_nil() {
            Ok(None)
        } else {
            T::decode(decoder).map(Some)
        }
    }
}

impl<'de, T: Decode<'de>> Decode<'de> for Vec<T> {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        let mut seq = decoder.unkeyed()?;
        let mut items = Vec::with_capacity(seq.len().min(4096));
        while !seq.is_at_end() {
            items.push(seq.decode_with()?);
        }
        Ok(items)
    }
}

macro_rules! impl_decode_scalar {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl<'de> Decode<'de> for $ty {
                fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
                    decoder.$method()
                }
            }
        )*
    };
}

impl_decode_scalar! {
    bool => decode_bool,
    i8 => decode_i8,
    i16 => decode_i16,
    i32 => decode_i32,
    i64 => decode_i64,
    i128 => decode_i128,
    u8 => decode_u8,
    u16 => decode_u16,
    u32 => decode_u32,
    u64 => decode_u64,
    u128 => decode_u128,
    f32 => decode_f32,
    f64 => decode_f64,
    char => decode_char,
}

impl<'de> Decode<'de> for &'de str {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        decoder.decode_str()
    }
}

impl<'de> Decode<'de> for String {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        decoder.decode_str().map(str::to_string)
    }
}

impl<'de> Decode<'de> for () {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        if decoder.is_nil() {
            Ok(())
        } else {
            Err(decoder.mismatch("nil"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string_table::StringTableView;

    fn context() -> DecodeContext<'static> {
        DecodeContext::new(StringTableView::default(), Metadata::new())
    }

    fn root<'a>(context: &'a DecodeContext<'static>, bytes: &'static [u8]) -> ValueDecoder<'a, 'static> {
        let region = Region::parse(bytes, context.width(), 0).unwrap();
        ValueDecoder::new(context, region, CodingPath::default())
    }

    #[test]
    fn test_empty_region_is_nil() {
        let context = context();
        assert!(root(&context, &[]).is_nil());
        assert_eq!(root(&context, &[0x01]).tag(), Tag::Nil);
    }

    #[test]
    fn test_integers_narrow_when_they_fit() {
        let context = context();
        let decoder = root(&context, &[0x02, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decoder.decode_i8().unwrap(), -1);
        assert_eq!(decoder.decode_i64().unwrap(), -1);

        let decoder = root(&context, &[0x03, 0x00, 0x01]);
        assert_eq!(decoder.decode_u16().unwrap(), 256);
        let err = decoder.decode_u8().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_no_coercion_between_kinds() {
        let context = context();
        let decoder = root(&context, &[0x03, 0x05]);
        assert!(matches!(
            decoder.decode_i32(),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(decoder.decode_str().is_err());
    }

    #[test]
    fn test_invalid_scalar_width() {
        let context = context();
        let decoder = root(&context, &[0x02, 1, 2, 3]);
        assert!(matches!(
            decoder.decode_i32(),
            Err(Error::InvalidScalarWidth(3))
        ));
    }

    #[test]
    fn test_float_widening() {
        let context = context();
        let bytes: &'static [u8] = &[0x03, 0x00, 0x00, 0xc0, 0x3f];
        let decoder = root(&context, bytes);
        assert_eq!(decoder.decode_f32().unwrap(), 1.5);
        assert_eq!(decoder.decode_f64().unwrap(), 1.5);
    }

    #[test]
    fn test_sequence_cursor() {
        let context = context();
        // Regular unkeyed: [nil, u8 7]
        let bytes: &'static [u8] = &[0x20, 2, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0x01, 0x03, 7];
        let mut seq = root(&context, bytes).unkeyed().unwrap();
        assert_eq!(seq.len(), 2);
        assert!(seq.is_next_nil().unwrap());
        assert!(seq.is_next_nil().unwrap());
        assert_eq!(seq.current_index(), 0);
        assert!(seq.decode_nil().unwrap());
        assert!(!seq.decode_nil().unwrap());
        assert_eq!(seq.current_index(), 1);
        assert_eq!(seq.decode::<u8>().unwrap(), 7);
        assert!(seq.is_at_end());
        assert!(matches!(
            seq.decode::<u8>(),
            Err(Error::OutOfRange { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn test_uniform_sequence_shares_header() {
        let context = context();
        let bytes: &'static [u8] = &[0x22, 3, 0, 0, 0, 1, 0, 0, 0, 0x03, 4, 5, 6];
        let decoder = root(&context, bytes);
        assert_eq!(decoder.borrowed_bytes(), Some(&[4u8, 5, 6][..]));
        let values: Vec<u8> = decoder.decode_with().unwrap();
        assert_eq!(values, vec![4, 5, 6]);
    }

    #[test]
    fn test_declared_payload_must_fit() {
        let context = context();
        let err = Region::parse(&[0x21, 2, 0, 0, 0, 4, 0, 0, 0, 1], context.width(), 0).unwrap_err();
        assert!(matches!(err, Error::ContainerTooSmall { needed: 8, available: 1 }));
    }

    #[test]
    fn test_kind_mismatch_names_the_path() {
        let context = context();
        let bytes: &'static [u8] = &[0x22, 1, 0, 0, 0, 1, 0, 0, 0, 0x03, 9];
        let mut seq = root(&context, bytes).unkeyed().unwrap();
        let err = seq.nested_keyed().err().unwrap();
        assert!(err.to_string().contains("[0]"));
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
    }
}
