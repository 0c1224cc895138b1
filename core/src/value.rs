//! The element value model.
//!
//! A value keeps the bytes found on the wire, verbatim,
//! in a cheaply sliceable buffer which may alias the read source.
//! Interpretation as integers, floats or tags happens on access,
//! honouring the endianness of the transfer syntax the value came in.
//! Text interpretation additionally depends on the data set's
//! specific character set and is performed by the layers above.

use crate::header::{DataElementHeader, Header, Length, Tag};
use crate::vr::VR;
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use bytes::Bytes;
use smallvec::SmallVec;
use snafu::Snafu;

/// Vector type for the decoded values of a multi-valued element.
pub type C<T> = SmallVec<[T; 2]>;

/// An error during interpretation of a primitive value.
#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum ValueAccessError {
    /// No value bytes to interpret.
    #[snafu(display("value is empty"))]
    EmptyValue,
    /// The byte count does not divide into values of the requested width.
    #[snafu(display("value length {} is not a multiple of {}", len, unit))]
    UnalignedLength { len: usize, unit: usize },
}

type Result<T, E = ValueAccessError> = std::result::Result<T, E>;

/// A primitive data element value: the verbatim bytes
/// plus the byte order they were encoded in.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    data: Bytes,
    order: Endianness,
}

impl RawValue {
    /// Create a value from its encoded bytes and byte order.
    pub fn new(data: impl Into<Bytes>, order: Endianness) -> Self {
        RawValue {
            data: data.into(),
            order,
        }
    }

    /// Create a little-endian value from its encoded bytes.
    pub fn little(data: impl Into<Bytes>) -> Self {
        RawValue::new(data, Endianness::Little)
    }

    /// Create an empty value.
    pub fn empty() -> Self {
        RawValue::little(Bytes::new())
    }

    /// Create a value holding the UTF-8 bytes of the given text.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        RawValue::little(Bytes::copy_from_slice(text.as_ref().as_bytes()))
    }

    /// Create a value holding the given unsigned 16-bit integers.
    pub fn from_u16s(values: &[u16], order: Endianness) -> Self {
        let mut buf = vec![0u8; values.len() * 2];
        for (chunk, v) in buf.chunks_exact_mut(2).zip(values) {
            match order {
                Endianness::Little => LittleEndian::write_u16(chunk, *v),
                Endianness::Big => BigEndian::write_u16(chunk, *v),
            }
        }
        RawValue::new(buf, order)
    }

    /// Create a value holding the given unsigned 32-bit integers.
    pub fn from_u32s(values: &[u32], order: Endianness) -> Self {
        let mut buf = vec![0u8; values.len() * 4];
        for (chunk, v) in buf.chunks_exact_mut(4).zip(values) {
            match order {
                Endianness::Little => LittleEndian::write_u32(chunk, *v),
                Endianness::Big => BigEndian::write_u32(chunk, *v),
            }
        }
        RawValue::new(buf, order)
    }

    /// The verbatim value bytes.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// The verbatim value bytes as a plain slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Recover the inner byte buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// The byte order the value was encoded in.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.order
    }

    /// The number of value bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Deep-copy the value into storage independent from the read source.
    pub fn detached(&self) -> RawValue {
        RawValue {
            data: Bytes::copy_from_slice(&self.data),
            order: self.order,
        }
    }

    /// Interpret the bytes as UTF-8 without copying,
    /// if they happen to be valid UTF-8.
    pub fn as_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    fn checked_chunks(&self, unit: usize) -> Result<std::slice::ChunksExact<'_, u8>> {
        if self.data.len() % unit != 0 {
            return UnalignedLengthSnafu {
                len: self.data.len(),
                unit,
            }
            .fail();
        }
        Ok(self.data.chunks_exact(unit))
    }

    fn first_chunk(&self, unit: usize) -> Result<&[u8]> {
        if self.data.is_empty() {
            return EmptyValueSnafu.fail();
        }
        if self.data.len() < unit {
            return UnalignedLengthSnafu {
                len: self.data.len(),
                unit,
            }
            .fail();
        }
        Ok(&self.data[..unit])
    }

    /// Decode the first value as an unsigned 16-bit integer.
    pub fn uint16(&self) -> Result<u16> {
        let c = self.first_chunk(2)?;
        Ok(match self.order {
            Endianness::Little => LittleEndian::read_u16(c),
            Endianness::Big => BigEndian::read_u16(c),
        })
    }

    /// Decode all values as unsigned 16-bit integers.
    pub fn uint16_all(&self) -> Result<C<u16>> {
        let order = self.order;
        Ok(self
            .checked_chunks(2)?
            .map(|c| match order {
                Endianness::Little => LittleEndian::read_u16(c),
                Endianness::Big => BigEndian::read_u16(c),
            })
            .collect())
    }

    /// Decode the first value as a signed 16-bit integer.
    pub fn int16(&self) -> Result<i16> {
        self.uint16().map(|v| v as i16)
    }

    /// Decode the first value as an unsigned 32-bit integer.
    pub fn uint32(&self) -> Result<u32> {
        let c = self.first_chunk(4)?;
        Ok(match self.order {
            Endianness::Little => LittleEndian::read_u32(c),
            Endianness::Big => BigEndian::read_u32(c),
        })
    }

    /// Decode all values as unsigned 32-bit integers.
    pub fn uint32_all(&self) -> Result<C<u32>> {
        let order = self.order;
        Ok(self
            .checked_chunks(4)?
            .map(|c| match order {
                Endianness::Little => LittleEndian::read_u32(c),
                Endianness::Big => BigEndian::read_u32(c),
            })
            .collect())
    }

    /// Decode the first value as a signed 32-bit integer.
    pub fn int32(&self) -> Result<i32> {
        self.uint32().map(|v| v as i32)
    }

    /// Decode the first value as an unsigned 64-bit integer.
    pub fn uint64(&self) -> Result<u64> {
        let c = self.first_chunk(8)?;
        Ok(match self.order {
            Endianness::Little => LittleEndian::read_u64(c),
            Endianness::Big => BigEndian::read_u64(c),
        })
    }

    /// Decode all values as unsigned 64-bit integers.
    pub fn uint64_all(&self) -> Result<C<u64>> {
        let order = self.order;
        Ok(self
            .checked_chunks(8)?
            .map(|c| match order {
                Endianness::Little => LittleEndian::read_u64(c),
                Endianness::Big => BigEndian::read_u64(c),
            })
            .collect())
    }

    /// Decode the first value as a signed 64-bit integer.
    pub fn int64(&self) -> Result<i64> {
        self.uint64().map(|v| v as i64)
    }

    /// Decode the first value as a single precision float.
    pub fn float32(&self) -> Result<f32> {
        let c = self.first_chunk(4)?;
        Ok(match self.order {
            Endianness::Little => LittleEndian::read_f32(c),
            Endianness::Big => BigEndian::read_f32(c),
        })
    }

    /// Decode the first value as a double precision float.
    pub fn float64(&self) -> Result<f64> {
        let c = self.first_chunk(8)?;
        Ok(match self.order {
            Endianness::Little => LittleEndian::read_f64(c),
            Endianness::Big => BigEndian::read_f64(c),
        })
    }

    /// Decode all values as double precision floats.
    pub fn float64_all(&self) -> Result<C<f64>> {
        let order = self.order;
        Ok(self
            .checked_chunks(8)?
            .map(|c| match order {
                Endianness::Little => LittleEndian::read_f64(c),
                Endianness::Big => BigEndian::read_f64(c),
            })
            .collect())
    }

    /// Decode all values as attribute tags.
    pub fn tags(&self) -> Result<C<Tag>> {
        let order = self.order;
        Ok(self
            .checked_chunks(4)?
            .map(|c| match order {
                Endianness::Little => {
                    Tag(LittleEndian::read_u16(&c[..2]), LittleEndian::read_u16(&c[2..]))
                }
                Endianness::Big => {
                    Tag(BigEndian::read_u16(&c[..2]), BigEndian::read_u16(&c[2..]))
                }
            })
            .collect())
    }
}

/// A sequence value: an ordered list of item data sets
/// plus the length declared on the wire.
#[derive(Debug, Clone)]
pub struct DataSetSequence<I> {
    items: Vec<I>,
    length: Length,
}

impl<I> DataSetSequence<I> {
    /// Create a sequence value from its parts.
    pub fn new(items: Vec<I>, length: Length) -> Self {
        DataSetSequence { items, length }
    }

    /// Create an empty sequence with zero length.
    pub fn empty() -> Self {
        DataSetSequence {
            items: Vec::new(),
            length: Length(0),
        }
    }

    /// The item data sets, in source order.
    #[inline]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Mutable access to the item data sets.
    #[inline]
    pub fn items_mut(&mut self) -> &mut Vec<I> {
        &mut self.items
    }

    /// Recover the items.
    pub fn into_items(self) -> Vec<I> {
        self.items
    }

    /// The length declared on the wire, possibly undefined.
    #[inline]
    pub fn length(&self) -> Length {
        self.length
    }

    /// The number of items.
    #[inline]
    pub fn multiplicity(&self) -> usize {
        self.items.len()
    }
}

/// Item order matters; declared lengths are compared
/// by inner representation so that two delimited sequences
/// with equal items are equal.
impl<I: PartialEq> PartialEq for DataSetSequence<I> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.length.inner_eq(other.length)
    }
}

/// The extended offset table companion data
/// from (7FE0,0001) and (7FE0,0002), when present.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedOffsetTable {
    /// 64-bit frame offsets.
    pub offsets: Vec<u64>,
    /// 64-bit frame lengths, if the companion element was present.
    pub lengths: Option<Vec<u64>>,
}

/// An encapsulated pixel data value:
/// the basic offset table followed by the encoded fragments,
/// in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelFragmentSequence {
    offset_table: Vec<u32>,
    fragments: Vec<Bytes>,
    extended: Option<ExtendedOffsetTable>,
}

impl PixelFragmentSequence {
    /// Create a fragment sequence value from its parts.
    pub fn new(offset_table: Vec<u32>, fragments: Vec<Bytes>) -> Self {
        PixelFragmentSequence {
            offset_table,
            fragments,
            extended: None,
        }
    }

    /// The basic offset table: one 32-bit offset per frame,
    /// or empty when the table was not provided.
    #[inline]
    pub fn offset_table(&self) -> &[u32] {
        &self.offset_table
    }

    /// The encoded fragments, in source order.
    #[inline]
    pub fn fragments(&self) -> &[Bytes] {
        &self.fragments
    }

    /// The extended offset table, if its companion elements
    /// were present in the enclosing data set.
    #[inline]
    pub fn extended_offset_table(&self) -> Option<&ExtendedOffsetTable> {
        self.extended.as_ref()
    }

    /// Attach the extended offset table companion data.
    pub fn set_extended_offset_table(&mut self, table: ExtendedOffsetTable) {
        self.extended = Some(table);
    }

    /// Deep-copy all fragments into storage independent
    /// from the read source.
    pub fn detached(&self) -> PixelFragmentSequence {
        PixelFragmentSequence {
            offset_table: self.offset_table.clone(),
            fragments: self
                .fragments
                .iter()
                .map(|f| Bytes::copy_from_slice(f))
                .collect(),
            extended: self.extended.clone(),
        }
    }
}

/// A data element value, as one of its possible shapes:
/// primitive bytes, a sequence of data sets,
/// an encapsulated pixel fragment sequence,
/// or a deferred pixel payload of type `P`
/// (parked or skipped pixel data).
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I, P = NeverPixel> {
    /// Bytes directly interpretable under the element's VR.
    Primitive(RawValue),
    /// A nested sequence of data sets.
    Sequence(DataSetSequence<I>),
    /// Encapsulated pixel data fragments with their offset table.
    PixelSequence(PixelFragmentSequence),
    /// A deferred pixel data payload, defined by the layer
    /// which decides the pixel data load policy.
    Pixel(P),
}

impl<I, P> Value<I, P> {
    /// The verbatim value bytes.
    /// Sequences, fragment sequences and deferred pixel payloads
    /// expose an empty byte buffer.
    pub fn raw_bytes(&self) -> Bytes {
        match self {
            Value::Primitive(v) => v.bytes().clone(),
            _ => Bytes::new(),
        }
    }

    /// The primitive value, if this is one.
    pub fn primitive(&self) -> Option<&RawValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// The sequence items, if this is a sequence value.
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence(seq) => Some(seq.items()),
            _ => None,
        }
    }

    /// The fragment sequence, if this is encapsulated pixel data.
    pub fn fragments(&self) -> Option<&PixelFragmentSequence> {
        match self {
            Value::PixelSequence(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is a primitive value.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Primitive(_))
    }
}

impl<I, P> From<RawValue> for Value<I, P> {
    fn from(value: RawValue) -> Self {
        Value::Primitive(value)
    }
}

/// A data element: a header plus a value,
/// where `I` is the item data set type
/// and `P` the deferred pixel payload type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement<I, P = NeverPixel> {
    header: DataElementHeader,
    value: Value<I, P>,
}

impl<I, P> DataElement<I, P> {
    /// Create a data element from the given parts.
    /// The header length is derived from the value:
    /// the byte count for primitive values,
    /// the declared length for sequences,
    /// undefined for fragment sequences and deferred payloads.
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, value: impl Into<Value<I, P>>) -> Self {
        let value = value.into();
        let len = match &value {
            Value::Primitive(v) => Length(v.len() as u32),
            Value::Sequence(seq) => seq.length(),
            Value::PixelSequence(_) | Value::Pixel(_) => Length::UNDEFINED,
        };
        DataElement {
            header: DataElementHeader::new(tag, vr, len),
            value,
        }
    }

    /// Create a data element from an existing header and value.
    pub fn from_parts(header: DataElementHeader, value: Value<I, P>) -> Self {
        DataElement { header, value }
    }

    /// Create an empty primitive data element.
    pub fn empty<T: Into<Tag>>(tag: T, vr: VR) -> Self {
        DataElement {
            header: DataElementHeader::new(tag, vr, Length(0)),
            value: Value::Primitive(RawValue::empty()),
        }
    }

    /// Retrieve the element header.
    #[inline]
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// Retrieve the element's value representation.
    #[inline]
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// Retrieve the element value.
    #[inline]
    pub fn value(&self) -> &Value<I, P> {
        &self.value
    }

    /// Mutable access to the element value.
    #[inline]
    pub fn value_mut(&mut self) -> &mut Value<I, P> {
        &mut self.value
    }

    /// Recover the element value.
    pub fn into_value(self) -> Value<I, P> {
        self.value
    }

    /// The verbatim value bytes (empty for non-primitive values).
    pub fn raw_bytes(&self) -> Bytes {
        self.value.raw_bytes()
    }
}

impl<I, P> Header for DataElement<I, P> {
    #[inline]
    fn tag(&self) -> Tag {
        self.header.tag
    }

    #[inline]
    fn len(&self) -> Length {
        self.header.len
    }
}

/// An immaterial type representing an item data set which
/// can never exist, for element trees known to be flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmptyObject {}

/// An immaterial type representing a deferred pixel payload
/// which can never exist, for element trees where pixel data
/// is always materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NeverPixel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_access_honours_endianness() {
        let le = RawValue::new(vec![0x00, 0x02], Endianness::Little);
        assert_eq!(le.uint16().unwrap(), 0x0200);

        let be = RawValue::new(vec![0x02, 0x00], Endianness::Big);
        assert_eq!(be.uint16().unwrap(), 512);

        let v = RawValue::new(vec![1, 0, 2, 0, 3, 0], Endianness::Little);
        assert_eq!(&v.uint16_all().unwrap()[..], &[1, 2, 3]);
    }

    #[test]
    fn unaligned_numeric_access_fails() {
        let v = RawValue::little(vec![1, 2, 3]);
        assert!(matches!(
            v.uint16_all(),
            Err(ValueAccessError::UnalignedLength { len: 3, unit: 2 })
        ));
        assert!(matches!(
            RawValue::empty().uint16(),
            Err(ValueAccessError::EmptyValue)
        ));
    }

    #[test]
    fn tag_values() {
        let v = RawValue::new(vec![0x08, 0x00, 0x18, 0x00], Endianness::Little);
        assert_eq!(&v.tags().unwrap()[..], &[Tag(0x0008, 0x0018)]);
    }

    #[test]
    fn utf8_passthrough_borrows() {
        let v = RawValue::from_text("Doe^John");
        let s = v.as_utf8().unwrap();
        assert_eq!(s, "Doe^John");
        // the returned slice aliases the value bytes
        assert_eq!(s.as_ptr(), v.as_slice().as_ptr());
    }

    #[test]
    fn detached_values_are_independent() {
        let source = Bytes::from_static(b"ORIGINAL");
        let v = RawValue::new(source.slice(..), Endianness::Little);
        let owned = v.detached();
        assert_eq!(owned.as_slice(), v.as_slice());
        assert_ne!(owned.as_slice().as_ptr(), v.as_slice().as_ptr());
    }

    #[test]
    fn delimited_sequences_compare_equal() {
        let a: DataSetSequence<u8> = DataSetSequence::new(vec![1, 2], Length::UNDEFINED);
        let b = DataSetSequence::new(vec![1, 2], Length::UNDEFINED);
        assert_eq!(a, b);
        let c = DataSetSequence::new(vec![1, 2], Length(16));
        assert_ne!(a, c);
    }

    #[test]
    fn non_primitive_values_have_empty_raw_bytes() {
        let seq: Value<u8> = Value::Sequence(DataSetSequence::empty());
        assert!(seq.raw_bytes().is_empty());
        let frags: Value<u8> = Value::PixelSequence(PixelFragmentSequence::default());
        assert!(frags.raw_bytes().is_empty());
    }
}
