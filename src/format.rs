//! Binary Format Reference
//!
//! This module documents the byte layout produced by [`to_vec`](crate::to_vec)
//! and [`encode`](crate::encode). It contains no code.
//!
//! # Document
//!
//! All fixed-width fields are little-endian.
//!
//! ```text
//! [u8 major][u8 minor]                      format version, currently 1.0
//! [u32 count]([u32 length][utf-8 bytes])*   string table
//! [root header][root payload]
//! ```
//!
//! The version must match exactly. The string table holds every distinct
//! string value and keyed-container key of the document, once, in the order
//! the encoder first met them. Strings and keys refer to it by index.
//!
//! ## Index Width
//!
//! | Table size | Index width |
//! |------------|-------------|
//! | up to 256 | 1 byte |
//! | up to 65 536 | 2 bytes |
//! | larger | 4 bytes |
//!
//! # Headers
//!
//! Every value is a header followed by its payload. The first header byte is
//! the tag:
//!
//! | Tag | Kind | Header fields after the tag |
//! |-----|------|------------------------------|
//! | `0x01` | nil | none, empty payload |
//! | `0x02` | signed | none |
//! | `0x03` | unsigned | none |
//! | `0x04` | string | none, payload is one index |
//! | `0x10` | regular keyed | `u32 count`, `count × (index key, u32 size)` |
//! | `0x11` | equisize keyed | `u32 count`, `u32 item size`, `count × index key` |
//! | `0x12` | uniform keyed | as `0x11`, then one shared child header |
//! | `0x20` | regular unkeyed | `u32 count`, `count × u32 size` |
//! | `0x21` | equisize unkeyed | `u32 count`, `u32 item size` |
//! | `0x22` | uniform unkeyed | `u32 count`, `u32 item size`, one shared child header |
//!
//! Scalars have no length field: their width (1, 2, 4, 8 or 16 bytes) is the
//! size of the region the parent gives them. Signed scalars are two's
//! complement. Booleans are one-byte unsigned scalars, floats are unsigned
//! scalars holding their IEEE-754 bits and characters are strings.
//!
//! Unit values and `None` are both stored as nil. An option wrapping one of
//! them, such as `Some(())` or `Some(None)`, is therefore also nil and reads
//! back as `None`.
//!
//! ## Nesting
//!
//! The root value is at depth 0 and each container adds one level. Values may
//! nest at most 128 levels ([`MAX_DEPTH`](crate::MAX_DEPTH)); encoders refuse
//! deeper trees and decoders report them as a format error. The same limit
//! applies to chains of shared child headers.
//!
//! ## Sizes
//!
//! A child's size is the number of bytes it takes in the parent payload. In
//! regular and equisize containers each child carries its own header, so the
//! size covers header and payload. In uniform containers the header is shared
//! and written once, so the size covers the payload only.
//!
//! A zero-length child region decodes as nil.
//!
//! ## Choosing a Layout
//!
//! The encoder computes the size of every valid layout and writes the
//! smallest. Uniform is valid when all children have identical headers and
//! equally long payloads, equisize when all children take the same number of
//! bytes, and regular always. Ties go to uniform, then equisize. Containers
//! without children are regular.
//!
//! ## Duplicate Keys
//!
//! A keyed header may name the same key twice. Decoders use the last
//! occurrence.
//!
//! # Example
//!
//! A struct with two `i32` fields is a uniform keyed container: both fields
//! share the one-byte signed header, so each entry costs a key index plus its
//! four payload bytes.
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Pair {
//!     a: i32,
//!     b: i32,
//! }
//!
//! let bytes = serde_lnt::to_vec(&Pair { a: 1, b: 2 }).unwrap();
//! assert_eq!(
//!     bytes,
//!     [
//!         0x01, 0x00, // version 1.0
//!         0x02, 0x00, 0x00, 0x00, // two strings
//!         0x01, 0x00, 0x00, 0x00, b'a',
//!         0x01, 0x00, 0x00, 0x00, b'b',
//!         0x12, // uniform keyed
//!         0x02, 0x00, 0x00, 0x00, // two entries
//!         0x04, 0x00, 0x00, 0x00, // four payload bytes each
//!         0x00, 0x01, // keys "a" and "b"
//!         0x02, // shared header: signed
//!         0x01, 0x00, 0x00, 0x00, // a = 1
//!         0x02, 0x00, 0x00, 0x00, // b = 2
//!     ]
//! );
//! ```
