//! Error types for binary encoding and decoding.
//!
//! Every failure surfaces as a single [`Error`] value. Errors are raised at
//! the point where the problem is detected and are never recovered from
//! inside the crate: a decode either returns a complete value or one error.
//!
//! ## Error Categories
//!
//! [`Error::kind`] groups the variants into the categories callers usually
//! branch on:
//!
//! - **Format**: the bytes are not a valid document (empty input, wrong
//!   version, broken string table, unknown tag, a region that is too small,
//!   nesting that is too deep)
//! - **Type mismatch**: the decoding code asked for a different kind of value
//!   than the one stored
//! - **Key not found**: a keyed lookup missed
//! - **Out of range**: a sequence was read past its last element
//! - **Encoding**: the value cannot be represented (overflowing counts,
//!   unsupported map keys)
//!
//! ## Examples
//!
//! ```rust
//! use serde_lnt::{from_slice, ErrorKind};
//!
//! let err = from_slice::<i32>(&[]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Format);
//! ```

use crate::context::CodingPath;
use std::fmt;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or truncated input.
    Format,
    /// The requested kind of value does not match the stored header.
    TypeMismatch,
    /// A keyed container has no entry for the requested key.
    KeyNotFound,
    /// A sequence was read past its declared length.
    OutOfRange,
    /// The value cannot be represented in the format.
    Encoding,
    /// I/O failures and free-form messages raised by `Serialize` /
    /// `Deserialize` implementations.
    Other,
}

/// Represents all possible errors that can occur while encoding or decoding.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// The input buffer holds no bytes at all
    #[error("Empty input: a document starts with a two-byte format version")]
    EmptyInput,

    /// The document was written with a different format version
    #[error("Unsupported format version {major}.{minor} (expected {expected_major}.{expected_minor})")]
    UnsupportedVersion {
        major: u8,
        minor: u8,
        expected_major: u8,
        expected_minor: u8,
    },

    /// The string table is truncated or holds invalid UTF-8
    #[error("Invalid string table: {0}")]
    InvalidStringTable(String),

    /// A string payload or key refers past the end of the string table
    #[error("String index {index} out of range for a table of {len} strings")]
    StringIndexOutOfRange { index: u32, len: usize },

    /// A header starts with a byte that is not a known tag
    #[error("Unknown header tag 0x{0:02x}")]
    UnknownTag(u8),

    /// A header declares more bytes than the enclosing region provides
    #[error("Container too small: {needed} bytes declared, {available} available")]
    ContainerTooSmall { needed: u64, available: usize },

    /// Containers nest deeper than the format allows
    #[error("Nesting too deep: values may nest at most {0} levels")]
    NestingTooDeep(usize),

    /// A scalar payload has a width no fixed-width type uses
    #[error("Invalid scalar width: {0} bytes")]
    InvalidScalarWidth(usize),

    /// The stored value is not of the requested kind
    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: CodingPath,
        expected: String,
        found: String,
    },

    /// A keyed lookup missed
    #[error("Key not found at {path}: {key:?}")]
    KeyNotFound { path: CodingPath, key: String },

    /// A sequence was read past its end
    #[error("Index {index} out of range at {path}: sequence holds {len} elements")]
    OutOfRange {
        path: CodingPath,
        index: usize,
        len: usize,
    },

    /// A count, size or index does not fit its fixed-width field
    #[error("Encoding overflow: {0}")]
    Overflow(String),

    /// Map key that cannot be stored as a string
    #[error("Map keys must be strings, integers, bools, chars or unit variants, found {0}")]
    KeyMustBeString(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Returns the category this error belongs to.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_lnt::{Error, ErrorKind};
    ///
    /// assert_eq!(Error::UnknownTag(0x7f).kind(), ErrorKind::Format);
    /// assert_eq!(Error::custom("boom").kind(), ErrorKind::Other);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput
            | Error::UnsupportedVersion { .. }
            | Error::InvalidStringTable(_)
            | Error::StringIndexOutOfRange { .. }
            | Error::UnknownTag(_)
            | Error::ContainerTooSmall { .. }
            | Error::NestingTooDeep(_)
            | Error::InvalidScalarWidth(_) => ErrorKind::Format,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::Overflow(_) | Error::KeyMustBeString(_) => ErrorKind::Encoding,
            Error::Io(_) | Error::Custom(_) => ErrorKind::Other,
        }
    }

    /// Returns `true` for errors caused by malformed input.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    pub(crate) fn invalid_string_table(msg: impl Into<String>) -> Self {
        Error::InvalidStringTable(msg.into())
    }

    pub(crate) fn container_too_small(needed: u64, available: usize) -> Self {
        Error::ContainerTooSmall { needed, available }
    }

    pub(crate) fn type_mismatch(path: &CodingPath, expected: &str, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            path: path.clone(),
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    pub(crate) fn key_not_found(path: &CodingPath, key: &str) -> Self {
        Error::KeyNotFound {
            path: path.clone(),
            key: key.to_string(),
        }
    }

    pub(crate) fn out_of_range(path: &CodingPath, index: usize, len: usize) -> Self {
        Error::OutOfRange {
            path: path.clone(),
            index,
            len,
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        Error::Overflow(format!("{} exceeds u32::MAX", what))
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_lnt::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::TypeMismatch {
            path: CodingPath::default(),
            expected: exp.to_string(),
            found: unexp.to_string(),
        }
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Self::invalid_type(unexp, exp)
    }

    fn missing_field(field: &'static str) -> Self {
        Error::KeyNotFound {
            path: CodingPath::default(),
            key: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
