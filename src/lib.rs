//! # serde_lnt
//!
//! A Serde-compatible binary format that picks the smallest layout for every
//! container it writes.
//!
//! ## How It Works
//!
//! A document starts with a format version and a string table holding every
//! string and key once. Values follow as a header and a payload. For each
//! keyed or unkeyed container the encoder compares three layouts and keeps
//! the cheapest:
//!
//! - **Regular**: every child is sized individually
//! - **Equisize**: all children take the same number of bytes, so one size
//!   is stored
//! - **Uniform**: all children share one header as well, so it is written once
//!
//! A `Vec<u32>` therefore costs a dozen header bytes plus four bytes per
//! element, and a list of structs with fixed-width fields stores its field
//! names once per struct rather than once per field value.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_lnt = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_lnt::{from_slice, to_vec};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User {
//!     id: 123,
//!     name: "Alice".to_string(),
//!     active: true,
//! };
//!
//! let bytes = to_vec(&user).unwrap();
//! let user_back: User = from_slice(&bytes).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Container API
//!
//! Types that want to decide their own layout implement [`Encode`] and
//! [`Decode`] and work with keyed and unkeyed containers directly. This is
//! also where base layers and caller [`Metadata`] are available.
//!
//! ```rust
//! use serde_lnt::{decode_with_options, encode, BinaryOptions, Decode, Result, ValueDecoder};
//!
//! struct Celsius(f64);
//!
//! impl<'de> Decode<'de> for Celsius {
//!     fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
//!         let offset = decoder.metadata().get::<f64>("offset").copied().unwrap_or(0.0);
//!         Ok(Celsius(decoder.decode_f64()? + offset))
//!     }
//! }
//!
//! let bytes = encode(&21.5f64).unwrap();
//! let options = BinaryOptions::new().with_metadata("offset", -0.5f64);
//! let reading: Celsius = decode_with_options(&bytes, &options).unwrap();
//! assert_eq!(reading.0, 21.0);
//! ```
//!
//! ### Dynamic Values
//!
//! ```rust
//! use serde_lnt::{from_slice, to_vec, Value};
//!
//! let bytes = to_vec(&vec!["a", "b"]).unwrap();
//! let value: Value = from_slice(&bytes).unwrap();
//! assert_eq!(value.as_unkeyed().map(<[_]>::len), Some(2));
//! ```
//!
//! ## Decoding Rules
//!
//! - Integers decode into any type their stored value fits, but signed and
//!   unsigned values never convert into each other
//! - Decoders only parse what they are asked for, so reading a subset of a
//!   struct's fields skips the rest without walking it
//! - A key written twice resolves to its last value
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Declared counts and sizes are checked against the remaining input before
//!   anything is allocated
//! - Nesting is bounded by [`MAX_DEPTH`] on both sides, so deep input cannot
//!   exhaust the stack
//! - Corrupt input produces an [`Error`] and never a panic
//!
//! See [`format`] for the byte-level layout.
//!
//! ## Examples
//!
//! The `demos/` directory holds runnable programs:
//!
//! - **`simple.rs`** - round-tripping a derived struct
//! - **`layered.rs`** - base layers and metadata through the container API
//! - **`layout_inspection.rs`** - which layout each shape of data gets, and
//!   how its size compares to JSON
//!
//! Run any of them with: `cargo run --example <name>`

mod context;
pub mod de;
pub mod decoder;
mod document;
pub mod encoder;
pub mod error;
pub mod format;
pub mod header;
mod layout;
pub mod map;
pub mod options;
mod reader;
pub mod ser;
mod storage;
mod string_table;
pub mod value;

pub use context::{CodingPath, PathSegment};
pub use de::Deserializer;
pub use decoder::{Decode, KeyedDecoder, SeqDecoder, ValueDecoder};
pub use document::{root_header, VERSION_MAJOR, VERSION_MINOR};
pub use encoder::{Encode, KeyedEncoder, SeqEncoder, ValueEncoder, BASE_KEY};
pub use error::{Error, ErrorKind, Result};
pub use header::{
    EquisizeKeyedHeader, EquisizeUnkeyedHeader, Header, KeyedEntry, RegularKeyedHeader,
    RegularUnkeyedHeader, Tag, UniformUnkeyedHeader, MAX_DEPTH,
};
pub use map::ValueMap;
pub use options::{BinaryOptions, Metadata};
pub use ser::Serializer;
pub use string_table::IndexWidth;
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;

/// Serialize any `T: Serialize` to a binary document.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::to_vec;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let bytes = to_vec(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(&bytes[..2], &[1, 0]);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented, for example a map
/// whose keys are not strings.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_vec_with_options(value, &BinaryOptions::default())
}

/// Serialize any `T: Serialize` with caller metadata available to
/// [`Encode`] implementations along the way.
///
/// # Errors
///
/// Returns an error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<T>(value: &T, options: &BinaryOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    document::encode_document(options, |encoder| encoder.encode(value))
}

/// Serialize any `T: Serialize` into a writer.
///
/// The document is built in memory first; the writer sees a single
/// `write_all`.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &[1u16, 2, 3]).unwrap();
/// assert!(!buffer.is_empty());
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let bytes = to_vec(value)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Deserialize an instance of type `T` from a binary document.
///
/// Strings and byte slices can be borrowed from `v`.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::{from_slice, to_vec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let bytes = to_vec(&Point { x: 1, y: 2 }).unwrap();
/// let point: Point = from_slice(&bytes).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not a valid document or do not hold a
/// value of type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<'de, T>(v: &'de [u8]) -> Result<T>
where
    T: Deserialize<'de>,
{
    from_slice_with_options(v, &BinaryOptions::default())
}

/// Deserialize an instance of type `T`, making caller metadata available to
/// [`Decode`] implementations along the way.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid document or do not hold a
/// value of type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options<'de, T>(v: &'de [u8], options: &BinaryOptions) -> Result<T>
where
    T: Deserialize<'de>,
{
    document::decode_document(v, options, |decoder| decoder.decode())
}

/// Deserialize an instance of type `T` from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::{from_reader, to_vec};
/// use std::io::Cursor;
///
/// let bytes = to_vec(&vec![String::from("x")]).unwrap();
/// let strings: Vec<String> = from_reader(Cursor::new(bytes)).unwrap();
/// assert_eq!(strings, ["x"]);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, or if the bytes read are not a valid
/// document holding a value of type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    from_slice(&bytes)
}

/// Encode a value through its [`Encode`] implementation.
///
/// # Errors
///
/// Returns an error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Encode,
{
    encode_with_options(value, &BinaryOptions::default())
}

/// Encode a value through its [`Encode`] implementation, with caller
/// metadata reachable from every encoder.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::{encode_with_options, BinaryOptions, Encode, Result, ValueEncoder};
///
/// struct Price(u32);
///
/// impl Encode for Price {
///     fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
///         let cents = encoder.metadata().get::<bool>("cents").copied().unwrap_or(false);
///         encoder.encode_u32(if cents { self.0 * 100 } else { self.0 })
///     }
/// }
///
/// let options = BinaryOptions::new().with_metadata("cents", true);
/// let bytes = encode_with_options(&Price(3), &options).unwrap();
/// assert_eq!(serde_lnt::from_slice::<u32>(&bytes).unwrap(), 300);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options<T>(value: &T, options: &BinaryOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Encode,
{
    document::encode_document(options, |encoder| encoder.encode_with(value))
}

/// Decode a value through its [`Decode`] implementation.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid document or the
/// implementation rejects them.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode<'de, T>(v: &'de [u8]) -> Result<T>
where
    T: Decode<'de>,
{
    decode_with_options(v, &BinaryOptions::default())
}

/// Decode a value through its [`Decode`] implementation, with caller
/// metadata reachable from every decoder.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid document or the
/// implementation rejects them.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_with_options<'de, T>(v: &'de [u8], options: &BinaryOptions) -> Result<T>
where
    T: Decode<'de>,
{
    document::decode_document(v, options, |decoder| decoder.decode_with())
}
