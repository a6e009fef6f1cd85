//! Serde serialization.
//!
//! [`Serializer`] drives a [`ValueEncoder`], mapping the serde data model
//! onto the binary one:
//!
//! - unit, unit structs and `None` become nil
//! - integers, `bool` and floats become signed or unsigned scalars
//! - `str`, `String` and `char` become string-table references
//! - sequences, tuples and byte slices become unkeyed containers
//! - structs and maps become keyed containers
//! - unit variants are stored as their name, every other variant as a
//!   keyed container with the variant name as its only key
//!
//! Most users should go through the crate-root functions:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_lnt::{root_header, to_vec, Tag};
//!
//! #[derive(Serialize)]
//! struct Sample {
//!     a: i32,
//!     b: i32,
//! }
//!
//! let bytes = to_vec(&Sample { a: 1, b: 2 }).unwrap();
//! // Both fields share one header, so the struct is uniform.
//! assert_eq!(root_header(&bytes).unwrap().tag(), Tag::UniformKeyed);
//! ```

use crate::encoder::{KeyedEncoder, SeqEncoder, ValueEncoder};
use crate::{Error, Result};
use serde::{ser, Serialize};

/// Serde serializer writing into one value slot.
///
/// Obtained through [`ValueEncoder::encode`]; it cannot be created on its
/// own because it needs a running encode pass.
pub struct Serializer<'a> {
    encoder: ValueEncoder<'a>,
}

impl<'a> Serializer<'a> {
    pub(crate) fn new(encoder: ValueEncoder<'a>) -> Self {
        Serializer { encoder }
    }
}

impl<'a> ser::Serializer for Serializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = SeqSerializer<'a>;
    type SerializeTupleVariant = SeqSerializer<'a>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = StructSerializer<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.encoder.encode_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.encoder.encode_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.encoder.encode_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.encoder.encode_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.encoder.encode_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.encoder.encode_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.encoder.encode_u8(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.encoder.encode_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.encoder.encode_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.encoder.encode_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.encoder.encode_u128(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.encoder.encode_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.encoder.encode_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.encoder.encode_str(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.encoder.encode_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let mut seq = self.encoder.unkeyed();
        for byte in v {
            seq.encode_with(byte)?;
        }
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        self.encoder.encode_nil()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.encoder.encode_nil()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.encoder.encode_nil()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.encoder.encode_str(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.encoder.keyed().encode(variant, value)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqSerializer {
            seq: self.encoder.unkeyed(),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SeqSerializer {
            seq: self.encoder.keyed().into_entry(variant).unkeyed(),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapSerializer {
            keyed: self.encoder.keyed(),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(StructSerializer {
            keyed: self.encoder.keyed(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(StructSerializer {
            keyed: self.encoder.keyed().into_entry(variant).keyed(),
        })
    }
}

/// Serializer for sequences, tuples and tuple variants.
pub struct SeqSerializer<'a> {
    seq: SeqEncoder<'a>,
}

impl<'a> ser::SerializeSeq for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.seq.encode(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.seq.encode(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.seq.encode(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.seq.encode(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Serializer for maps. Keys are stored as strings.
pub struct MapSerializer<'a> {
    keyed: KeyedEncoder<'a>,
    pending_key: Option<String>,
}

impl<'a> ser::SerializeMap for MapSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        self.keyed.encode(&key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Serializer for structs and struct variants.
pub struct StructSerializer<'a> {
    keyed: KeyedEncoder<'a>,
}

impl<'a> ser::SerializeStruct for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.keyed.encode(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.keyed.encode(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Renders a map key as the string it is stored under.
struct MapKeySerializer;

fn key_must_be_string(found: &str) -> Error {
    Error::KeyMustBeString(found.to_string())
}

macro_rules! serialize_key_display {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<String> {
                Ok(v.to_string())
            }
        )*
    };
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = ser::Impossible<String, Error>;
    type SerializeTuple = ser::Impossible<String, Error>;
    type SerializeTupleStruct = ser::Impossible<String, Error>;
    type SerializeTupleVariant = ser::Impossible<String, Error>;
    type SerializeMap = ser::Impossible<String, Error>;
    type SerializeStruct = ser::Impossible<String, Error>;
    type SerializeStructVariant = ser::Impossible<String, Error>;

    serialize_key_display! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_char: char,
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_must_be_string("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_must_be_string("f64"))
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_must_be_string("bytes"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_must_be_string("none"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string("option"))
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_must_be_string("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<String> {
        Err(key_must_be_string(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_string("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_string("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_string(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_string(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_string("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_string(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_string(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_map_keys_are_stringified() {
        assert_eq!(42u16.serialize(MapKeySerializer).unwrap(), "42");
        assert_eq!((-7i64).serialize(MapKeySerializer).unwrap(), "-7");
        assert_eq!(true.serialize(MapKeySerializer).unwrap(), "true");
        assert_eq!('x'.serialize(MapKeySerializer).unwrap(), "x");
        assert_eq!("key".serialize(MapKeySerializer).unwrap(), "key");
    }

    #[test]
    fn test_unit_variant_keys() {
        #[derive(Serialize)]
        enum Color {
            Red,
        }
        assert_eq!(Color::Red.serialize(MapKeySerializer).unwrap(), "Red");
    }

    #[test]
    fn test_composite_keys_rejected() {
        let err = vec![1, 2].serialize(MapKeySerializer).unwrap_err();
        assert!(matches!(err, Error::KeyMustBeString(_)));
        let err = 1.5f64.serialize(MapKeySerializer).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Encoding);
    }
}
