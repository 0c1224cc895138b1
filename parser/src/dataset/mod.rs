//! Interpretation of DICOM data sets as streams of tokens.

use bytes::Bytes;
use dcmkit_core::header::DataElementHeader;
use dcmkit_core::value::RawValue;
use dcmkit_core::{Length, Tag};
use std::fmt;

pub mod read;
pub mod write;

pub use self::read::DataSetReader;
pub use self::write::DataSetWriter;

/// Whether a pending structural token refers to a sequence
/// or to one of its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqTokenType {
    /// A sequence (or encapsulated pixel data element).
    Sequence,
    /// An item inside a sequence.
    Item,
}

/// A token of a DICOM data set stream:
/// a data header, a value, or a structural marker.
#[derive(Debug, Clone)]
pub enum DataToken {
    /// A data header of a primitive value.
    ElementHeader(DataElementHeader),
    /// A primitive data element value, verbatim.
    PrimitiveValue(RawValue),
    /// The beginning of a sequence element.
    SequenceStart {
        /// the sequence tag
        tag: Tag,
        /// the declared length, possibly undefined
        len: Length,
    },
    /// The ending delimiter of a sequence
    /// or of an encapsulated pixel data element.
    SequenceEnd,
    /// The beginning of a new item in a sequence.
    ItemStart {
        /// the declared item length, possibly undefined
        len: Length,
    },
    /// The ending delimiter of an item.
    ItemEnd,
    /// The beginning of an encapsulated pixel data element.
    PixelSequenceStart {
        /// the pixel data tag
        tag: Tag,
    },
    /// The basic offset table of an encapsulated pixel data element.
    OffsetTable(Vec<u32>),
    /// The value of one encapsulated fragment.
    ItemValue(Bytes),
    /// One encapsulated fragment left in the source
    /// under the lazy pixel data policy.
    DeferredItemValue {
        /// absolute position of the fragment's first value byte
        offset: u64,
        /// the fragment length in bytes
        len: u32,
    },
    /// One encapsulated fragment passed over
    /// under the skip pixel data policy.
    SkippedItemValue {
        /// the fragment length in bytes
        len: u32,
    },
    /// A native pixel data element left in the source
    /// under the lazy pixel data policy.
    DeferredPixelValue {
        /// the element header
        header: DataElementHeader,
        /// absolute position of the first value byte
        offset: u64,
    },
    /// A native pixel data element passed over
    /// under the skip pixel data policy.
    SkippedPixelValue {
        /// the element header
        header: DataElementHeader,
    },
}

impl fmt::Display for DataToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataToken::PrimitiveValue(v) => write!(f, "PrimitiveValue({} bytes)", v.len()),
            DataToken::ItemValue(v) => write!(f, "ItemValue({} bytes)", v.len()),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Declared lengths are compared by inner representation,
/// so that two undefined lengths count as equal.
impl PartialEq<Self> for DataToken {
    fn eq(&self, other: &Self) -> bool {
        use DataToken::*;
        match (self, other) {
            (ElementHeader(h1), ElementHeader(h2)) => {
                h1.tag == h2.tag && h1.vr == h2.vr && h1.len.inner_eq(h2.len)
            }
            (
                SequenceStart {
                    tag: tag1,
                    len: len1,
                },
                SequenceStart {
                    tag: tag2,
                    len: len2,
                },
            ) => tag1 == tag2 && len1.inner_eq(*len2),
            (ItemStart { len: len1 }, ItemStart { len: len2 }) => len1.inner_eq(*len2),
            (PrimitiveValue(v1), PrimitiveValue(v2)) => v1 == v2,
            (ItemValue(v1), ItemValue(v2)) => v1 == v2,
            (OffsetTable(v1), OffsetTable(v2)) => v1 == v2,
            (
                DeferredItemValue {
                    offset: o1,
                    len: l1,
                },
                DeferredItemValue {
                    offset: o2,
                    len: l2,
                },
            ) => o1 == o2 && l1 == l2,
            (SkippedItemValue { len: l1 }, SkippedItemValue { len: l2 }) => l1 == l2,
            (
                DeferredPixelValue {
                    header: h1,
                    offset: o1,
                },
                DeferredPixelValue {
                    header: h2,
                    offset: o2,
                },
            ) => h1.tag == h2.tag && o1 == o2,
            (SkippedPixelValue { header: h1 }, SkippedPixelValue { header: h2 }) => {
                h1.tag == h2.tag
            }
            (PixelSequenceStart { tag: t1 }, PixelSequenceStart { tag: t2 }) => t1 == t2,
            (ItemEnd, ItemEnd) | (SequenceEnd, SequenceEnd) => true,
            _ => false,
        }
    }
}

impl DataToken {
    /// Check whether this token starts a sequence of nested data sets
    /// or an encapsulated pixel data element.
    pub fn is_sequence_start(&self) -> bool {
        matches!(
            self,
            DataToken::SequenceStart { .. } | DataToken::PixelSequenceStart { .. }
        )
    }

    /// Check whether this token ends a sequence
    /// or an encapsulated pixel data element.
    pub fn is_sequence_end(&self) -> bool {
        matches!(self, DataToken::SequenceEnd)
    }
}
