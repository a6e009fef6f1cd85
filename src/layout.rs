//! Container layout selection.
//!
//! Given the finalized children of a keyed or unkeyed container, pick the
//! header representation with the smallest encoded size:
//!
//! | Layout | Keyed | Unkeyed |
//! |---|---|---|
//! | regular | `1 + 4 + n·(w + 4) + Σ item` | `1 + 4 + 4n + Σ item` |
//! | equisize | `1 + 4 + 4 + n·w + n·item` | `1 + 4 + 4 + n·item` |
//! | uniform | `1 + 4 + 4 + n·w + sub + n·payload` | `1 + 4 + 4 + sub + n·payload` |
//!
//! where `w` is the index width and `n` the number of children. Uniform is
//! only a candidate when every child has the same header and the same payload
//! length; equisize only when every child has the same inline size. Ties go
//! to the more specific layout.

use crate::header::{
    EquisizeKeyedHeader, EquisizeUnkeyedHeader, Header, KeyedEntry, RegularKeyedHeader,
    RegularUnkeyedHeader, UniformUnkeyedHeader,
};
use crate::string_table::IndexWidth;
use crate::{Error, Result};
use tracing::trace;

/// A finalized value: its header plus the payload bytes that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Encoded {
    pub(crate) header: Header,
    pub(crate) payload: Vec<u8>,
}

impl Encoded {
    pub(crate) fn scalar(header: Header, payload: Vec<u8>) -> Self {
        Encoded { header, payload }
    }

    pub(crate) fn nil() -> Self {
        Encoded {
            header: Header::Nil,
            payload: Vec::new(),
        }
    }

    /// Header plus payload, the bytes a child takes when written inline.
    pub(crate) fn inline_len(&self, width: IndexWidth) -> usize {
        self.header.encoded_len(width) + self.payload.len()
    }

    pub(crate) fn write_inline(&self, out: &mut Vec<u8>, width: IndexWidth) -> Result<()> {
        self.header.write(out, width)?;
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Candidate layouts, ordered by preference when their costs tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layout {
    Uniform,
    Equisize,
    Regular,
}

/// Sizes shared by every child, when they are shared.
struct Shape {
    /// Common payload length, if all headers and payload lengths match.
    uniform: Option<usize>,
    /// Common inline length, if all children take the same space.
    equisize: Option<usize>,
    inline_total: u64,
    payload_total: u64,
}

impl Shape {
    fn of<'a>(children: impl Iterator<Item = &'a Encoded> + Clone, width: IndexWidth) -> Shape {
        let mut iter = children.clone();
        let Some(first) = iter.next() else {
            return Shape {
                uniform: None,
                equisize: None,
                inline_total: 0,
                payload_total: 0,
            };
        };

        let payload_len = first.payload.len();
        let inline_len = first.inline_len(width);
        let mut uniform = true;
        let mut equisize = true;
        let mut inline_total = 0u64;
        let mut payload_total = 0u64;

        for child in children {
            let inline = child.inline_len(width);
            inline_total += inline as u64;
            payload_total += child.payload.len() as u64;
            equisize &= inline == inline_len;
            uniform &= child.payload.len() == payload_len && child.header == first.header;
        }

        Shape {
            uniform: uniform.then_some(payload_len),
            equisize: equisize.then_some(inline_len),
            inline_total,
            payload_total,
        }
    }
}

/// Chooses the cheapest candidate. Candidates are `(layout, cost)` pairs;
/// `min_by_key` on `(cost, layout)` makes ties fall to the earlier variant.
fn cheapest(candidates: impl Iterator<Item = (Layout, u64)>) -> (Layout, u64) {
    candidates
        .min_by_key(|&(layout, cost)| (cost, layout))
        .unwrap_or((Layout::Regular, 0))
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::overflow(what))
}

/// Lays out a keyed container. `children` holds the key index and the
/// finalized value of every entry, in insertion order.
pub(crate) fn select_keyed(children: &[(u32, Encoded)], width: IndexWidth) -> Result<Encoded> {
    let n = children.len() as u64;
    let w = width.bytes() as u64;
    let shape = Shape::of(children.iter().map(|(_, child)| child), width);

    let regular = 1 + 4 + n * (w + 4) + shape.inline_total;
    let equisize = shape.equisize.map(|item| 1 + 4 + 4 + n * w + n * item as u64);
    let uniform = match (shape.uniform, children.first()) {
        (Some(_), Some((_, first))) => {
            Some(1 + 4 + 4 + n * w + first.header.encoded_len(width) as u64 + shape.payload_total)
        }
        _ => None,
    };

    let (layout, cost) = cheapest(
        [
            Some((Layout::Regular, regular)),
            equisize.map(|cost| (Layout::Equisize, cost)),
            uniform.map(|cost| (Layout::Uniform, cost)),
        ]
        .into_iter()
        .flatten(),
    );
    trace!(?layout, cost, children = children.len(), "keyed container layout");

    let mut payload = Vec::with_capacity(cost as usize);
    let header = match layout {
        Layout::Regular => {
            let mut entries = Vec::with_capacity(children.len());
            for (key, child) in children {
                entries.push(KeyedEntry {
                    key: *key,
                    size: to_u32(child.inline_len(width), "entry size")?,
                });
                child.write_inline(&mut payload, width)?;
            }
            Header::RegularKeyed(RegularKeyedHeader { entries })
        }
        Layout::Equisize => {
            for (_, child) in children {
                child.write_inline(&mut payload, width)?;
            }
            Header::EquisizeKeyed(EquisizeKeyedHeader {
                item_size: to_u32(shape.equisize.unwrap_or(0), "item size")?,
                subheader: None,
                keys: children.iter().map(|(key, _)| *key).collect(),
            })
        }
        Layout::Uniform => {
            for (_, child) in children {
                payload.extend_from_slice(&child.payload);
            }
            let subheader = children
                .first()
                .map(|(_, child)| Box::new(child.header.clone()));
            Header::EquisizeKeyed(EquisizeKeyedHeader {
                item_size: to_u32(shape.uniform.unwrap_or(0), "item size")?,
                subheader,
                keys: children.iter().map(|(key, _)| *key).collect(),
            })
        }
    };
    Ok(Encoded { header, payload })
}

/// Lays out a sequence from its finalized elements.
pub(crate) fn select_unkeyed(children: &[Encoded], width: IndexWidth) -> Result<Encoded> {
    let n = children.len() as u64;
    let shape = Shape::of(children.iter(), width);
    let count = to_u32(children.len(), "element count")?;

    let regular = 1 + 4 + 4 * n + shape.inline_total;
    let equisize = shape.equisize.map(|item| 1 + 4 + 4 + n * item as u64);
    let uniform = match (shape.uniform, children.first()) {
        (Some(_), Some(first)) => {
            Some(1 + 4 + 4 + first.header.encoded_len(width) as u64 + shape.payload_total)
        }
        _ => None,
    };

    let (layout, cost) = cheapest(
        [
            Some((Layout::Regular, regular)),
            equisize.map(|cost| (Layout::Equisize, cost)),
            uniform.map(|cost| (Layout::Uniform, cost)),
        ]
        .into_iter()
        .flatten(),
    );
    trace!(?layout, cost, children = children.len(), "unkeyed container layout");

    let mut payload = Vec::with_capacity(cost as usize);
    let header = match (layout, children.first()) {
        (Layout::Uniform, Some(first)) => {
            for child in children {
                payload.extend_from_slice(&child.payload);
            }
            Header::UniformUnkeyed(UniformUnkeyedHeader {
                item_size: to_u32(first.payload.len(), "item size")?,
                subheader: Box::new(first.header.clone()),
                count,
            })
        }
        (Layout::Equisize, _) => {
            for child in children {
                child.write_inline(&mut payload, width)?;
            }
            Header::EquisizeUnkeyed(EquisizeUnkeyedHeader {
                item_size: to_u32(shape.equisize.unwrap_or(0), "item size")?,
                count,
            })
        }
        _ => {
            let mut sizes = Vec::with_capacity(children.len());
            for child in children {
                sizes.push(to_u32(child.inline_len(width), "element size")?);
                child.write_inline(&mut payload, width)?;
            }
            Header::RegularUnkeyed(RegularUnkeyedHeader { sizes })
        }
    };
    Ok(Encoded { header, payload })
}
