//! Data element header and value encoding for the native
//! transfer syntax codings.

use byteordered::Endianness;
use dcmkit_core::{DataElementHeader, Tag, VR};
use snafu::{Backtrace, Snafu};
use std::io::{self, Write};
use std::marker::PhantomData;

pub mod basic;
pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;

/// Module-level error type:
/// for errors which may occur while encoding DICOM data.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to write tag"))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write element header"))]
    WriteHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item header"))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item delimiter"))]
    WriteItemDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write sequence delimiter"))]
    WriteSequenceDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write value bytes"))]
    WriteBytes {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write pixel data offset table"))]
    WriteOffsetTable {
        backtrace: Backtrace,
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for an encoder of basic binary values
/// under a specific byte order.
/// Like `BasicDecode`, this trait is not object safe.
pub trait BasicEncode {
    /// Retrieve the encoder's endianness.
    fn endianness(&self) -> Endianness;

    /// Encode an unsigned short value to the given writer.
    fn encode_us<W>(&self, to: W, value: u16) -> io::Result<()>
    where
        W: Write;

    /// Encode an unsigned long value to the given writer.
    fn encode_ul<W>(&self, to: W, value: u32) -> io::Result<()>
    where
        W: Write;

    /// Encode an unsigned very long value to the given writer.
    fn encode_uv<W>(&self, to: W, value: u64) -> io::Result<()>
    where
        W: Write;
}

/// Type trait for encoding DICOM element headers and
/// structural markers. The specific behaviour depends
/// on the transfer syntax.
pub trait Encode {
    /// Encode and write a tag to the given destination.
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write;

    /// Encode and write a data element header.
    /// Returns the number of bytes written.
    ///
    /// Under explicit VR, the header form (16-bit or 32-bit length)
    /// follows the value representation's metadata profile.
    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write;

    /// Encode and write an item header with the given length.
    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write;

    /// Encode and write an item delimiter.
    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a sequence delimiter.
    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a basic offset table.
    /// Returns the number of bytes written.
    fn encode_offset_table<W>(&self, to: W, offset_table: &[u32]) -> Result<usize>
    where
        W: Write;
}

/// Type trait for encoding to a specific writer type.
/// This is the object safe form of [`Encode`].
pub trait EncodeTo<W: ?Sized> {
    /// Retrieve the encoder's endianness.
    fn endianness(&self) -> Endianness;

    /// Encode and write a tag.
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()>;

    /// Encode and write a data element header.
    /// Returns the number of bytes written.
    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize>;

    /// Encode and write an item header.
    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()>;

    /// Encode and write an item delimiter.
    fn encode_item_delimiter(&self, to: &mut W) -> Result<()>;

    /// Encode and write a sequence delimiter.
    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()>;

    /// Encode and write a basic offset table.
    fn encode_offset_table(&self, to: &mut W, offset_table: &[u32]) -> Result<usize>;
}

impl<W: ?Sized, T: ?Sized> EncodeTo<W> for Box<T>
where
    T: EncodeTo<W>,
{
    fn endianness(&self) -> Endianness {
        (**self).endianness()
    }

    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()> {
        (**self).encode_tag(to, tag)
    }

    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize> {
        (**self).encode_element_header(to, de)
    }

    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()> {
        (**self).encode_item_header(to, len)
    }

    fn encode_item_delimiter(&self, to: &mut W) -> Result<()> {
        (**self).encode_item_delimiter(to)
    }

    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()> {
        (**self).encode_sequence_delimiter(to)
    }

    fn encode_offset_table(&self, to: &mut W, offset_table: &[u32]) -> Result<usize> {
        (**self).encode_offset_table(to, offset_table)
    }
}

/// A wrapper adapting an [`Encode`] implementation
/// into an [`EncodeTo`] implementation for a fixed writer type.
#[derive(Debug, Default, Clone)]
pub struct EncoderFor<T, W: ?Sized> {
    inner: T,
    phantom: PhantomData<W>,
}

impl<T, W: ?Sized> EncoderFor<T, W> {
    /// Wrap the given encoder.
    pub fn new(inner: T) -> Self {
        EncoderFor {
            inner,
            phantom: PhantomData,
        }
    }
}

impl<T, W: ?Sized> EncodeTo<W> for EncoderFor<T, W>
where
    T: Encode + BasicEncode,
    W: Write,
{
    fn endianness(&self) -> Endianness {
        BasicEncode::endianness(&self.inner)
    }

    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()> {
        self.inner.encode_tag(to, tag)
    }

    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize> {
        self.inner.encode_element_header(to, de)
    }

    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()> {
        self.inner.encode_item_header(to, len)
    }

    fn encode_item_delimiter(&self, to: &mut W) -> Result<()> {
        self.inner.encode_item_delimiter(to)
    }

    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()> {
        self.inner.encode_sequence_delimiter(to)
    }

    fn encode_offset_table(&self, to: &mut W, offset_table: &[u32]) -> Result<usize> {
        self.inner.encode_offset_table(to, offset_table)
    }
}

/// The width in bytes of the binary unit of the given VR,
/// for byte order conversion purposes.
/// Character data and opaque byte data have a unit of 1.
pub fn binary_unit(vr: VR) -> usize {
    match vr {
        VR::US | VR::SS | VR::OW | VR::AT => 2,
        VR::UL | VR::SL | VR::FL | VR::OF | VR::OL => 4,
        VR::FD | VR::OD | VR::UV | VR::SV | VR::OV => 8,
        _ => 1,
    }
}

/// Re-align verbatim value bytes from one byte order to another,
/// swapping each binary unit of the value representation.
/// Values with a unit of 1 (text, `OB`, `UN`) are returned as-is.
pub fn realign_value(vr: VR, data: &[u8], from: Endianness, to: Endianness) -> Vec<u8> {
    let unit = binary_unit(vr);
    let mut out = data.to_vec();
    if from != to && unit > 1 {
        for chunk in out.chunks_exact_mut(unit) {
            chunk.reverse();
        }
        // AT values swap the group and element halves independently,
        // which chunked reversal of 2-byte units already does
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_realignment() {
        let le = [0x00, 0x02, 0x10, 0x00];
        let be = realign_value(VR::US, &le, Endianness::Little, Endianness::Big);
        assert_eq!(be, vec![0x02, 0x00, 0x00, 0x10]);

        // same order is a pass-through
        let same = realign_value(VR::US, &le, Endianness::Little, Endianness::Little);
        assert_eq!(same, le.to_vec());

        // text is never swapped
        let text = realign_value(VR::PN, b"Doe^John", Endianness::Little, Endianness::Big);
        assert_eq!(text, b"Doe^John".to_vec());

        let fd = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let swapped = realign_value(VR::FD, &fd, Endianness::Big, Endianness::Little);
        assert_eq!(swapped, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }
}
