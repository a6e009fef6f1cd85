//! Serde deserialization.
//!
//! [`Deserializer`] reads one value through a [`ValueDecoder`]. Typed
//! requests (`deserialize_u16`, `deserialize_struct`, ...) check the stored
//! header and fail with a type mismatch when it does not fit; no value is
//! ever coerced between kinds. `deserialize_any` is driven by the tag and, for
//! scalars, the stored width.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_lnt::{from_slice, to_vec};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! enum Shape {
//!     Empty,
//!     Circle { radius: u32 },
//! }
//!
//! let shapes = vec![Shape::Empty, Shape::Circle { radius: 3 }];
//! let bytes = to_vec(&shapes).unwrap();
//! let back: Vec<Shape> = from_slice(&bytes).unwrap();
//! assert_eq!(back, shapes);
//! ```

use crate::context::CodingPath;
use crate::decoder::{KeyedDecoder, SeqDecoder, ValueDecoder};
use crate::header::Tag;
use crate::{Error, Result};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

/// Serde deserializer over one decoded value.
///
/// Obtained through [`ValueDecoder::decode`], or indirectly through the
/// crate-root `from_*` functions.
pub struct Deserializer<'a, 'de> {
    decoder: ValueDecoder<'a, 'de>,
}

impl<'a, 'de> Deserializer<'a, 'de> {
    pub(crate) fn new(decoder: ValueDecoder<'a, 'de>) -> Self {
        Deserializer { decoder }
    }
}

/// Fills in the location of a missing struct field or a value a visitor
/// rejected. Serde reports those without any context.
fn locate(err: Error, path: &CodingPath) -> Error {
    match err {
        Error::KeyNotFound { path: found, key } if found.is_root() => {
            Error::key_not_found(path, &key)
        }
        Error::TypeMismatch {
            path: found,
            expected,
            found: actual,
        } if found.is_root() => Error::type_mismatch(path, &expected, actual),
        other => other,
    }
}

impl<'de, 'a> de::Deserializer<'de> for Deserializer<'a, 'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let decoder = self.decoder;
        match decoder.tag() {
            Tag::Nil => visitor.visit_unit(),
            Tag::Signed => match decoder.scalar_payload()?.len() {
                1 => visitor.visit_i8(decoder.decode_i8()?),
                2 => visitor.visit_i16(decoder.decode_i16()?),
                4 => visitor.visit_i32(decoder.decode_i32()?),
                8 => visitor.visit_i64(decoder.decode_i64()?),
                _ => visitor
                    .visit_i128(decoder.decode_i128()?)
                    .map_err(|err| locate(err, decoder.coding_path())),
            },
            Tag::Unsigned => match decoder.scalar_payload()?.len() {
                1 => visitor.visit_u8(decoder.decode_u8()?),
                2 => visitor.visit_u16(decoder.decode_u16()?),
                4 => visitor.visit_u32(decoder.decode_u32()?),
                8 => visitor.visit_u64(decoder.decode_u64()?),
                _ => visitor
                    .visit_u128(decoder.decode_u128()?)
                    .map_err(|err| locate(err, decoder.coding_path())),
            },
            Tag::String => visitor.visit_borrowed_str(decoder.decode_str()?),
            Tag::RegularKeyed | Tag::EquisizeKeyed | Tag::UniformKeyed => {
                visitor.visit_map(MapAccess::new(decoder.keyed()?))
            }
            Tag::RegularUnkeyed | Tag::EquisizeUnkeyed | Tag::UniformUnkeyed => {
                visitor.visit_seq(SeqAccess::new(decoder.unkeyed()?))
            }
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.decoder.decode_bool()?)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.decoder.decode_i8()?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(self.decoder.decode_i16()?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(self.decoder.decode_i32()?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.decoder.decode_i64()?)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i128(self.decoder.decode_i128()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.decoder.decode_u8()?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(self.decoder.decode_u16()?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(self.decoder.decode_u32()?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(self.decoder.decode_u64()?)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u128(self.decoder.decode_u128()?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.decoder.decode_f32()?)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.decoder.decode_f64()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_char(self.decoder.decode_char()?)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.decoder.decode_str()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Some(bytes) = self.decoder.borrowed_bytes() {
            return visitor.visit_borrowed_bytes(bytes);
        }
        let mut seq = self.decoder.unkeyed()?;
        let mut bytes = Vec::with_capacity(seq.len().min(4096));
        while !seq.is_at_end() {
            bytes.push(seq.decode_with::<u8>()?);
        }
        visitor.visit_byte_buf(bytes)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.decoder.is_nil() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.decoder.is_nil() {
            visitor.visit_unit()
        } else {
            Err(Error::type_mismatch(
                self.decoder.coding_path(),
                "nil",
                self.decoder.tag().to_string(),
            ))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(SeqAccess::new(self.decoder.unkeyed()?))
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(MapAccess::new(self.decoder.keyed()?))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let keyed = self.decoder.keyed()?;
        let path = keyed.coding_path().clone();
        visitor
            .visit_map(StructAccess::new(keyed, fields))
            .map_err(|err| locate(err, &path))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let tag = self.decoder.tag();
        if tag == Tag::String {
            return visitor.visit_enum(self.decoder.decode_str()?.into_deserializer());
        }
        match tag {
            Tag::RegularKeyed | Tag::EquisizeKeyed | Tag::UniformKeyed => {
                let keyed = self.decoder.keyed()?;
                if keyed.len() != 1 {
                    return Err(Error::type_mismatch(
                        keyed.coding_path(),
                        "enum variant with one key",
                        format!("keyed container with {} entries", keyed.len()),
                    ));
                }
                visitor.visit_enum(EnumAccess { keyed })
            }
            _ => Err(Error::type_mismatch(
                self.decoder.coding_path(),
                "enum",
                self.decoder.tag().to_string(),
            )),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct SeqAccess<'a, 'de> {
    seq: SeqDecoder<'a, 'de>,
}

impl<'a, 'de> SeqAccess<'a, 'de> {
    fn new(seq: SeqDecoder<'a, 'de>) -> Self {
        SeqAccess { seq }
    }
}

impl<'de, 'a> de::SeqAccess<'de> for SeqAccess<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.seq.next_decoder() {
            Some(decoder) => seed.deserialize(Deserializer::new(decoder?)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.seq.remaining())
    }
}

/// Walks every stored entry of a keyed container.
struct MapAccess<'a, 'de> {
    keyed: KeyedDecoder<'a, 'de>,
    position: usize,
    pending: Option<ValueDecoder<'a, 'de>>,
}

impl<'a, 'de> MapAccess<'a, 'de> {
    fn new(keyed: KeyedDecoder<'a, 'de>) -> Self {
        MapAccess {
            keyed,
            position: 0,
            pending: None,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for MapAccess<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(entry) = self.keyed.entry_at(self.position) else {
            return Ok(None);
        };
        let (key, decoder) = entry?;
        self.position += 1;
        self.pending = Some(decoder);
        seed.deserialize(MapKeyDeserializer {
            key,
            path: self.keyed.coding_path(),
        })
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let decoder = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("next_value_seed called before next_key_seed"))?;
        seed.deserialize(Deserializer::new(decoder))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keyed.len().saturating_sub(self.position))
    }
}

/// Looks up the declared fields of a struct, skipping those not stored.
struct StructAccess<'a, 'de> {
    keyed: KeyedDecoder<'a, 'de>,
    fields: std::slice::Iter<'static, &'static str>,
    current: Option<&'static str>,
}

impl<'a, 'de> StructAccess<'a, 'de> {
    fn new(keyed: KeyedDecoder<'a, 'de>, fields: &'static [&'static str]) -> Self {
        StructAccess {
            keyed,
            fields: fields.iter(),
            current: None,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for StructAccess<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let keyed = &self.keyed;
        let Some(&field) = self.fields.find(|field| keyed.contains_key(field)) else {
            return Ok(None);
        };
        self.current = Some(field);
        seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let field = self
            .current
            .take()
            .ok_or_else(|| Error::custom("next_value_seed called before next_key_seed"))?;
        seed.deserialize(Deserializer::new(self.keyed.entry(field)?))
    }
}

struct EnumAccess<'a, 'de> {
    keyed: KeyedDecoder<'a, 'de>,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;
    type Variant = VariantAccess<'a, 'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let (variant, decoder) = self
            .keyed
            .entry_at(0)
            .ok_or_else(|| Error::custom("enum container holds no variant"))??;
        let value = seed.deserialize(BorrowedStrDeserializer::<Error>::new(variant))?;
        Ok((value, VariantAccess { decoder }))
    }
}

struct VariantAccess<'a, 'de> {
    decoder: ValueDecoder<'a, 'de>,
}

impl<'de, 'a> de::VariantAccess<'de> for VariantAccess<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        de::Deserializer::deserialize_unit(Deserializer::new(self.decoder), de::IgnoredAny)
            .map(|_| ())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(Deserializer::new(self.decoder))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(Deserializer::new(self.decoder), visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(Deserializer::new(self.decoder), "", fields, visitor)
    }
}

/// Reads a stored map key back into the type it was written from.
struct MapKeyDeserializer<'p, 'de> {
    key: &'de str,
    path: &'p CodingPath,
}

macro_rules! deserialize_parsed_key {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                let value: $ty = self.key.parse().map_err(|_| {
                    Error::type_mismatch(
                        &self.path.key(self.key),
                        concat!(stringify!($ty), " map key"),
                        format!("{:?}", self.key),
                    )
                })?;
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de, 'p> de::Deserializer<'de> for MapKeyDeserializer<'p, 'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_parsed_key! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_char => visit_char: char,
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(self.key.into_deserializer())
    }

    forward_to_deserialize_any! {
        f32 f64 str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
