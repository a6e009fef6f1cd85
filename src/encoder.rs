//! Container API for encoding.
//!
//! [`ValueEncoder`] writes one value. It can become a [`KeyedEncoder`] or a
//! [`SeqEncoder`], which in turn hand out encoders for their entries. Types
//! that want direct control over their layout implement [`Encode`]; anything
//! implementing `serde::Serialize` can be written through
//! [`ValueEncoder::encode`] as well.
//!
//! # Examples
//!
//! ```rust
//! use serde_lnt::{decode, encode, Decode, Encode, Result, ValueDecoder, ValueEncoder};
//!
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Encode for Point {
//!     fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
//!         let mut keyed = encoder.keyed();
//!         keyed.encode("x", &self.x)?;
//!         keyed.encode("y", &self.y)
//!     }
//! }
//!
//! impl<'de> Decode<'de> for Point {
//!     fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
//!         let keyed = decoder.keyed()?;
//!         Ok(Point {
//!             x: keyed.decode("x")?,
//!             y: keyed.decode("y")?,
//!         })
//!     }
//! }
//!
//! let bytes = encode(&Point { x: 1, y: -1 }).unwrap();
//! let point: Point = decode(&bytes).unwrap();
//! assert_eq!((point.x, point.y), (1, -1));
//! ```

use crate::context::{CodingPath, EncodeContext};
use crate::options::Metadata;
use crate::ser::Serializer;
use crate::storage::Storage;
use crate::Result;
use indexmap::IndexMap;
use serde::Serialize;

/// Reserved key under which a keyed container stores its base layer.
pub const BASE_KEY: &str = "super";

/// A value that knows how to write itself through the container API.
pub trait Encode {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()>;
}

/// Writes exactly one value into its slot.
pub struct ValueEncoder<'a> {
    slot: &'a mut Storage,
    context: &'a EncodeContext,
    path: CodingPath,
}

macro_rules! encode_scalars {
    ($($method:ident: $ty:ty => $variant:ident),* $(,)?) => {
        $(
            pub fn $method(self, v: $ty) -> Result<()> {
                *self.slot = Storage::$variant(v.to_le_bytes().to_vec());
                Ok(())
            }
        )*
    };
}

impl<'a> ValueEncoder<'a> {
    pub(crate) fn new(slot: &'a mut Storage, context: &'a EncodeContext, path: CodingPath) -> Self {
        ValueEncoder {
            slot,
            context,
            path,
        }
    }

    pub fn encode_nil(self) -> Result<()> {
        *self.slot = Storage::Nil;
        Ok(())
    }

    /// Booleans are one-byte unsigned scalars holding 0 or 1.
    pub fn encode_bool(self, v: bool) -> Result<()> {
        *self.slot = Storage::Unsigned(vec![u8::from(v)]);
        Ok(())
    }

    encode_scalars! {
        encode_i8: i8 => Signed,
        encode_i16: i16 => Signed,
        encode_i32: i32 => Signed,
        encode_i64: i64 => Signed,
        encode_i128: i128 => Signed,
        encode_u8: u8 => Unsigned,
        encode_u16: u16 => Unsigned,
        encode_u32: u32 => Unsigned,
        encode_u64: u64 => Unsigned,
        encode_u128: u128 => Unsigned,
    }

    /// Floats are stored as their IEEE-754 bit pattern.
    pub fn encode_f32(self, v: f32) -> Result<()> {
        self.encode_u32(v.to_bits())
    }

    pub fn encode_f64(self, v: f64) -> Result<()> {
        self.encode_u64(v.to_bits())
    }

    pub fn encode_str(self, v: &str) -> Result<()> {
        *self.slot = Storage::String(v.to_string());
        Ok(())
    }

    /// Writes any `Serialize` value.
    pub fn encode<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(Serializer::new(self))
    }

    /// Writes a value through its [`Encode`] implementation.
    pub fn encode_with<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Encode,
    {
        value.encode(self)
    }

    /// Turns the slot into a keyed container.
    pub fn keyed(self) -> KeyedEncoder<'a> {
        KeyedEncoder {
            entries: self.slot.make_keyed(),
            context: self.context,
            path: self.path,
        }
    }

    /// Turns the slot into a sequence.
    pub fn unkeyed(self) -> SeqEncoder<'a> {
        SeqEncoder {
            items: self.slot.make_unkeyed(),
            context: self.context,
            path: self.path,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

/// Writes the entries of a keyed container.
///
/// Entries keep the order in which their keys were first written. Writing a
/// key again replaces its value without moving it.
pub struct KeyedEncoder<'a> {
    entries: &'a mut IndexMap<String, Storage>,
    context: &'a EncodeContext,
    path: CodingPath,
}

impl<'a> KeyedEncoder<'a> {
    /// Encoder for the entry under `key`, reset to nil.
    fn entry(&mut self, key: &str) -> ValueEncoder<'_> {
        let path = self.path.key(key);
        let slot = self.entries.entry(key.to_string()).or_default();
        *slot = Storage::Nil;
        ValueEncoder::new(slot, self.context, path)
    }

    /// Like [`entry`](Self::entry) but keeps the borrow of the container.
    pub(crate) fn into_entry(self, key: &str) -> ValueEncoder<'a> {
        let path = self.path.key(key);
        let slot = self.entries.entry(key.to_string()).or_default();
        *slot = Storage::Nil;
        ValueEncoder::new(slot, self.context, path)
    }

    pub fn encode<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entry(key).encode(value)
    }

    pub fn encode_with<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Encode,
    {
        self.entry(key).encode_with(value)
    }

    pub fn encode_nil(&mut self, key: &str) -> Result<()> {
        self.entry(key).encode_nil()
    }

    pub fn nested_keyed(&mut self, key: &str) -> KeyedEncoder<'_> {
        self.entry(key).keyed()
    }

    pub fn nested_unkeyed(&mut self, key: &str) -> SeqEncoder<'_> {
        self.entry(key).unkeyed()
    }

    /// Encoder for the base layer, stored under [`BASE_KEY`].
    pub fn base_layer(&mut self) -> ValueEncoder<'_> {
        self.entry(BASE_KEY)
    }

    pub fn base_layer_for(&mut self, key: &str) -> ValueEncoder<'_> {
        self.entry(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

/// Appends elements to a sequence.
pub struct SeqEncoder<'a> {
    items: &'a mut Vec<Storage>,
    context: &'a EncodeContext,
    path: CodingPath,
}

impl<'a> SeqEncoder<'a> {
    fn next(&mut self) -> ValueEncoder<'_> {
        let path = self.path.index(self.items.len());
        self.items.push(Storage::Nil);
        let last = self.items.len() - 1;
        ValueEncoder::new(&mut self.items[last], self.context, path)
    }

    pub fn encode<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next().encode(value)
    }

    pub fn encode_with<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Encode,
    {
        self.next().encode_with(value)
    }

    pub fn encode_nil(&mut self) -> Result<()> {
        self.next().encode_nil()
    }

    pub fn nested_keyed(&mut self) -> KeyedEncoder<'_> {
        self.next().keyed()
    }

    pub fn nested_unkeyed(&mut self) -> SeqEncoder<'_> {
        self.next().unkeyed()
    }

    /// Encoder for the base layer, appended as the next element.
    pub fn base_layer(&mut self) -> ValueEncoder<'_> {
        self.next()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        self.context.metadata()
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }
}

impl<T: ?Sized + Encode> Encode for &T {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        (**self).encode(encoder)
    }
}

impl<T: ?Sized + Encode> Encode for Box<T> {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        (**self).encode(encoder)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        match self {
            Some(value) => value.encode(encoder),
            None => encoder.encode_nil(),
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        self[..].encode(encoder)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        let mut seq = encoder.unkeyed();
        for item in self {
            seq.encode_with(item)?;
        }
        Ok(())
    }
}

macro_rules! impl_encode_scalar {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
                    encoder.$method(*self)
                }
            }
        )*
    };
}

impl_encode_scalar! {
    bool => encode_bool,
    i8 => encode_i8,
    i16 => encode_i16,
    i32 => encode_i32,
    i64 => encode_i64,
    i128 => encode_i128,
    u8 => encode_u8,
    u16 => encode_u16,
    u32 => encode_u32,
    u64 => encode_u64,
    u128 => encode_u128,
    f32 => encode_f32,
    f64 => encode_f64,
}

impl Encode for str {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        encoder.encode_str(self)
    }
}

impl Encode for String {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        encoder.encode_str(self)
    }
}

impl Encode for () {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        encoder.encode_nil()
    }
}
