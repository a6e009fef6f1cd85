//! Pass-scoped state shared by every container of one encode or decode call.
//!
//! A pass context is created by the top-level entry points, lent by
//! reference to every container created during the pass and dropped when the
//! call returns. Nothing in here is global, so independent passes on
//! different threads never contend.

use crate::options::Metadata;
use crate::string_table::{IndexWidth, StringTableView};
use std::fmt;

/// One step of a [`CodingPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Entry of a keyed container.
    Key(String),
    /// Element of a sequence.
    Index(usize),
}

/// Keys and positions leading from the document root to a container.
///
/// Rendered as `.key[index]` chains, or `<root>` for the document root.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::CodingPath;
///
/// let path = CodingPath::default().key("users").index(3).key("name");
/// assert_eq!(path.to_string(), ".users[3].name");
/// assert_eq!(CodingPath::default().to_string(), "<root>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CodingPath(Vec<PathSegment>);

impl CodingPath {
    /// Returns this path extended by a key.
    #[must_use]
    pub fn key(&self, key: &str) -> CodingPath {
        self.with(PathSegment::Key(key.to_string()))
    }

    /// Returns this path extended by a sequence position.
    #[must_use]
    pub fn index(&self, index: usize) -> CodingPath {
        self.with(PathSegment::Index(index))
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn with(&self, segment: PathSegment) -> CodingPath {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        CodingPath(segments)
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Encode-side pass context.
///
/// Strings are not collected here: staging only records them, and the
/// document encoder registers them in one walk once the tree is complete.
#[derive(Debug)]
pub(crate) struct EncodeContext {
    metadata: Metadata,
}

impl EncodeContext {
    pub(crate) fn new(metadata: Metadata) -> Self {
        EncodeContext { metadata }
    }

    pub(crate) fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Decode-side pass context: the parsed string table plus metadata.
#[derive(Debug)]
pub(crate) struct DecodeContext<'de> {
    strings: StringTableView<'de>,
    width: IndexWidth,
    metadata: Metadata,
}

impl<'de> DecodeContext<'de> {
    pub(crate) fn new(strings: StringTableView<'de>, metadata: Metadata) -> Self {
        let width = IndexWidth::for_len(strings.len());
        DecodeContext {
            strings,
            width,
            metadata,
        }
    }

    pub(crate) fn strings(&self) -> &StringTableView<'de> {
        &self.strings
    }

    pub(crate) fn width(&self) -> IndexWidth {
        self.width
    }

    pub(crate) fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
