//! Dynamic value representation.
//!
//! [`Value`] mirrors what a document can store without a schema: nil, signed
//! and unsigned integers, strings, keyed containers and sequences. It is
//! what you get when decoding data whose structure is not known at compile
//! time.
//!
//! The stored width of a scalar is not kept. Serializing a `Value` writes each
//! integer at the smallest width that holds it, which is also how the
//! decoder reads any narrower width back into a wider integer. Booleans and
//! floats come back as the unsigned scalars they are stored as.
//!
//! ## Examples
//!
//! ```rust
//! use serde::Serialize;
//! use serde_lnt::{from_slice, to_vec, Value};
//!
//! #[derive(Serialize)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let bytes = to_vec(&Point { x: 10, y: -20 }).unwrap();
//! let value: Value = from_slice(&bytes).unwrap();
//!
//! assert_eq!(value.get("x").and_then(Value::as_i64), Some(10));
//! assert_eq!(value.get("y").and_then(Value::as_i64), Some(-20));
//! ```

use crate::ValueMap;
use serde::de::{self, Unexpected, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Any value a document can hold.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Signed(i64),
    Unsigned(u64),
    String(String),
    Keyed(ValueMap),
    Unkeyed(Vec<Value>),
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    #[must_use]
    pub const fn is_keyed(&self) -> bool {
        matches!(self, Value::Keyed(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_unkeyed(&self) -> bool {
        matches!(self, Value::Unkeyed(_))
    }

    /// Returns the value as an `i64` if it is an integer that fits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_lnt::Value;
    ///
    /// assert_eq!(Value::Signed(-3).as_i64(), Some(-3));
    /// assert_eq!(Value::Unsigned(3).as_i64(), Some(3));
    /// assert_eq!(Value::Unsigned(u64::MAX).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Signed(v) => Some(v),
            Value::Unsigned(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Unsigned(v) => Some(v),
            Value::Signed(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_keyed(&self) -> Option<&ValueMap> {
        match self {
            Value::Keyed(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_unkeyed(&self) -> Option<&[Value]> {
        match self {
            Value::Unkeyed(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up `key` if this is a keyed value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_keyed().and_then(|map| map.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Signed(v) => write!(f, "{}", v),
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Keyed(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Unkeyed(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Signed(v) => {
                let v = *v;
                if let Ok(v) = i8::try_from(v) {
                    serializer.serialize_i8(v)
                } else if let Ok(v) = i16::try_from(v) {
                    serializer.serialize_i16(v)
                } else if let Ok(v) = i32::try_from(v) {
                    serializer.serialize_i32(v)
                } else {
                    serializer.serialize_i64(v)
                }
            }
            Value::Unsigned(v) => {
                let v = *v;
                if let Ok(v) = u8::try_from(v) {
                    serializer.serialize_u8(v)
                } else if let Ok(v) = u16::try_from(v) {
                    serializer.serialize_u16(v)
                } else if let Ok(v) = u32::try_from(v) {
                    serializer.serialize_u32(v)
                } else {
                    serializer.serialize_u64(v)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Keyed(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Unkeyed(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Unsigned(u64::from(value)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Signed(value))
            }

            fn visit_i128<E: de::Error>(self, value: i128) -> Result<Value, E> {
                i64::try_from(value)
                    .map(Value::Signed)
                    .map_err(|_| {
                        E::invalid_value(
                            Unexpected::Other("128-bit signed integer"),
                            &"an integer that fits in i64",
                        )
                    })
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::Unsigned(value))
            }

            fn visit_u128<E: de::Error>(self, value: u128) -> Result<Value, E> {
                u64::try_from(value)
                    .map(Value::Unsigned)
                    .map_err(|_| {
                        E::invalid_value(
                            Unexpected::Other("128-bit unsigned integer"),
                            &"an integer that fits in u64",
                        )
                    })
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Unsigned(value.to_bits()))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Unkeyed(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ValueMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Keyed(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected i64, found {}", value)))
    }
}

impl TryFrom<Value> for u64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_u64()
            .ok_or_else(|| crate::Error::custom(format!("expected u64, found {}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Unsigned(0) => Ok(false),
            Value::Unsigned(1) => Ok(true),
            other => Err(crate::Error::custom(format!("expected bool, found {}", other))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(crate::Error::custom(format!("expected string, found {}", other))),
        }
    }
}

macro_rules! impl_from_integer {
    ($variant:ident: $wide:ty => $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(<$wide>::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(Signed: i64 => i8, i16, i32, i64);
impl_from_integer!(Unsigned: u64 => u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Unsigned(u64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Unkeyed(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Keyed(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, root_header, to_vec, Header};

    #[test]
    fn test_integers_are_written_narrow() {
        let bytes = to_vec(&Value::Signed(-1)).unwrap();
        assert_eq!(root_header(&bytes).unwrap(), Header::Signed);
        assert_eq!(bytes.len(), 2 + 4 + 2);

        let bytes = to_vec(&Value::Unsigned(70_000)).unwrap();
        assert_eq!(bytes.len(), 2 + 4 + 1 + 4);
    }

    #[test]
    fn test_value_round_trip() {
        let mut map = ValueMap::new();
        map.insert("list".into(), Value::from(vec![Value::from(1u8), Value::Nil]));
        map.insert("name".into(), Value::from("x"));
        map.insert("neg".into(), Value::from(-300i32));
        let value = Value::Keyed(map);

        let bytes = to_vec(&value).unwrap();
        let back: Value = from_slice(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_typed_data_reads_as_value() {
        let bytes = to_vec(&(true, "s", Some(2u64))).unwrap();
        let value: Value = from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            Value::Unkeyed(vec![Value::Unsigned(1), Value::from("s"), Value::Unsigned(2)])
        );
        assert_eq!(value.to_string(), r#"[1, "s", 2]"#);
    }

    #[test]
    fn test_try_from() {
        assert!(bool::try_from(Value::Unsigned(1)).unwrap());
        assert!(bool::try_from(Value::Unsigned(2)).is_err());
        assert_eq!(String::try_from(Value::from("a")).unwrap(), "a");
        assert_eq!(i64::try_from(Value::Unsigned(5)).unwrap(), 5);
        assert_eq!(Value::from(None::<u8>), Value::Nil);
    }

    #[test]
    fn test_wide_integers_narrow_or_mismatch() {
        let value: Value = from_slice(&to_vec(&5i128).unwrap()).unwrap();
        assert_eq!(value, Value::Signed(5));
        let value: Value = from_slice(&to_vec(&u128::from(u64::MAX)).unwrap()).unwrap();
        assert_eq!(value, Value::Unsigned(u64::MAX));

        let mut wide = std::collections::BTreeMap::new();
        wide.insert("big", i128::MAX);
        let err = from_slice::<Value>(&to_vec(&wide).unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
        match err {
            crate::Error::TypeMismatch { path, .. } => assert_eq!(path.to_string(), ".big"),
            other => panic!("expected a type mismatch, got {:?}", other),
        }

        let err = from_slice::<Value>(&to_vec(&u128::MAX).unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
    }
}
