//! A stateful decoding abstraction over a byte source:
//! tracks the stream position, decodes headers through the
//! transfer syntax' element decoder, and hands out value data
//! as verbatim byte handles.

use crate::source::ByteSource;
use bytes::Bytes;
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use dcmkit_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmkit_core::value::RawValue;
use dcmkit_core::Tag;
use dcmkit_encoding::decode::explicit_le::ExplicitVRLittleEndianDecoder;
use dcmkit_encoding::decode::DecodeFrom;
use dcmkit_encoding::transfer_syntax::{DynDecoder, TransferSyntax};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Decoding in transfer syntax {} is unsupported", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },

    #[snafu(display("Could not decode element header at position {}", position))]
    DecodeElementHeader {
        position: u64,
        #[snafu(backtrace)]
        source: dcmkit_encoding::decode::Error,
    },

    #[snafu(display("Could not decode item header at position {}", position))]
    DecodeItemHeader {
        position: u64,
        #[snafu(backtrace)]
        source: dcmkit_encoding::decode::Error,
    },

    #[snafu(display(
        "Undefined value length of element tagged {} at position {}",
        tag,
        position
    ))]
    UndefinedValueLength {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read value from source at position {}", position))]
    ReadValueData {
        position: u64,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The stream position the error was raised at.
    pub fn position(&self) -> u64 {
        match self {
            Error::UnsupportedTransferSyntax { .. } => 0,
            Error::DecodeElementHeader { position, .. }
            | Error::DecodeItemHeader { position, .. }
            | Error::UndefinedValueLength { position, .. }
            | Error::ReadValueData { position, .. } => *position,
        }
    }

    /// Whether the error stems from running out of source data.
    pub fn is_eof(&self) -> bool {
        fn io_eof(e: &std::io::Error) -> bool {
            e.kind() == std::io::ErrorKind::UnexpectedEof
        }
        match self {
            Error::DecodeElementHeader { source, .. } | Error::DecodeItemHeader { source, .. } => {
                use dcmkit_encoding::decode::Error as De;
                match source {
                    De::ReadTag { source, .. }
                    | De::ReadVr { source, .. }
                    | De::ReadReserved { source, .. }
                    | De::ReadLength { source, .. }
                    | De::ReadItemHeader { source, .. } => io_eof(source),
                    _ => false,
                }
            }
            Error::ReadValueData { source, .. } => io_eof(source),
            _ => false,
        }
    }
}

/// Alias for a stateful decoder with its element decoder
/// resolved at run time.
pub type DynStatefulDecoder<S> = StatefulDecoder<DynDecoder<S>, S>;

/// Alias for the stateful decoder of a file meta group,
/// which is always in Explicit VR Little Endian.
pub type FileHeaderDecoder<S> = StatefulDecoder<ExplicitVRLittleEndianDecoder, S>;

/// A stateful element decoding abstraction:
/// a byte source, the element decoder of the transfer syntax,
/// and the running stream position.
#[derive(Debug)]
pub struct StatefulDecoder<D, S> {
    from: S,
    decoder: D,
    endianness: Endianness,
    position: u64,
}

impl<S> DynStatefulDecoder<S> {
    /// Create a stateful decoder for the given transfer syntax,
    /// assuming the given base position of the source.
    pub fn new_with(from: S, ts: &TransferSyntax, position: u64) -> Result<Self>
    where
        S: ByteSource,
    {
        let decoder = ts
            .decoder_for::<S>()
            .context(UnsupportedTransferSyntaxSnafu { uid: ts.uid() })?;
        Ok(StatefulDecoder {
            from,
            decoder,
            endianness: ts.endianness(),
            position,
        })
    }
}

impl<S> FileHeaderDecoder<S>
where
    S: ByteSource,
{
    /// Create a stateful decoder for a file meta group.
    pub fn file_header_decoder(from: S, position: u64) -> Self {
        StatefulDecoder {
            from,
            decoder: ExplicitVRLittleEndianDecoder::default(),
            endianness: Endianness::Little,
            position,
        }
    }
}

impl<D, S> StatefulDecoder<D, S> {
    /// Create a stateful decoder from its parts.
    pub fn new(from: S, decoder: D, endianness: Endianness, position: u64) -> Self {
        StatefulDecoder {
            from,
            decoder,
            endianness,
            position,
        }
    }

    /// The assumed position of the source.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The byte order of the transfer syntax in effect.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Recover the byte source.
    pub fn into_source(self) -> S {
        self.from
    }
}

impl<D, S> StatefulDecoder<D, S>
where
    D: DecodeFrom<S>,
    S: ByteSource,
{
    /// Decode the next element header, advancing past it.
    pub fn decode_header(&mut self) -> Result<DataElementHeader> {
        let (header, bytes_read) = self
            .decoder
            .decode_header(&mut self.from)
            .context(DecodeElementHeaderSnafu {
                position: self.position,
            })?;
        self.position += bytes_read as u64;
        Ok(header)
    }

    /// Decode the next sequence item header, advancing past it.
    pub fn decode_item_header(&mut self) -> Result<SequenceItemHeader> {
        let header = self
            .decoder
            .decode_item_header(&mut self.from)
            .context(DecodeItemHeaderSnafu {
                position: self.position,
            })?;
        self.position += 8;
        Ok(header)
    }

    /// Read the value bytes of the given element header, verbatim.
    /// The header must declare a defined length.
    pub fn read_value(&mut self, header: &DataElementHeader) -> Result<RawValue> {
        let len = header.len.get().context(UndefinedValueLengthSnafu {
            tag: header.tag,
            position: self.position,
        })?;
        let data = self.read_raw(len)?;
        Ok(RawValue::new(data, self.endianness))
    }

    /// Read `len` raw bytes from the source.
    pub fn read_raw(&mut self, len: u32) -> Result<Bytes> {
        let data = self
            .from
            .read_value(len as usize)
            .context(ReadValueDataSnafu {
                position: self.position,
            })?;
        self.position += u64::from(len);
        Ok(data)
    }

    /// Advance past `len` bytes without retaining them.
    pub fn skip_bytes(&mut self, len: u32) -> Result<()> {
        self.from
            .skip_value(u64::from(len))
            .context(ReadValueDataSnafu {
                position: self.position,
            })?;
        self.position += u64::from(len);
        Ok(())
    }

    /// Read a run of 32-bit unsigned integers
    /// in the transfer syntax' byte order.
    pub fn read_u32s(&mut self, len: u32) -> Result<Vec<u32>> {
        let data = self.read_raw(len)?;
        Ok(data
            .chunks_exact(4)
            .map(|c| match self.endianness {
                Endianness::Little => LittleEndian::read_u32(c),
                Endianness::Big => BigEndian::read_u32(c),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BytesSource;
    use dcmkit_core::header::Header;
    use dcmkit_core::VR;
    use dcmkit_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN;

    #[test]
    fn decode_and_read_value() {
        // (0010,0010) PN, 8 bytes, "Doe^John"
        let data: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x08, 0x00, 0x44, 0x6F, 0x65, 0x5E, 0x4A, 0x6F,
            0x68, 0x6E,
        ];
        let source = BytesSource::new(Bytes::from_static(data));
        let mut decoder =
            DynStatefulDecoder::new_with(source, &EXPLICIT_VR_LITTLE_ENDIAN, 0).unwrap();

        let header = decoder.decode_header().unwrap();
        assert_eq!(header.tag(), Tag(0x0010, 0x0010));
        assert_eq!(header.vr(), VR::PN);
        assert_eq!(header.len(), Length(8));
        assert_eq!(decoder.position(), 8);

        let value = decoder.read_value(&header).unwrap();
        assert_eq!(value.as_slice(), b"Doe^John");
        assert_eq!(decoder.position(), 16);
    }

    #[test]
    fn eof_is_detected() {
        let source = BytesSource::new(Bytes::from_static(&[0x10, 0x00]));
        let mut decoder =
            DynStatefulDecoder::new_with(source, &EXPLICIT_VR_LITTLE_ENDIAN, 0).unwrap();
        let err = decoder.decode_header().unwrap_err();
        assert!(err.is_eof());
    }
}
