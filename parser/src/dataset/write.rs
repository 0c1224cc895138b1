//! A stateful device for printing a DICOM data set in sequential
//! order. This is analogous to the `DataSetReader` type for
//! converting data set tokens back into bytes.

use super::{DataToken, SeqTokenType};
use dcmkit_core::value::RawValue;
use dcmkit_core::{DataElementHeader, Length, VR};
use dcmkit_encoding::encode::realign_value;
use dcmkit_encoding::transfer_syntax::{DynEncoder, TransferSyntax};
use dcmkit_encoding::EncodeTo;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Encoding in transfer syntax {} is unsupported", uid))]
    UnsupportedWriteTransferSyntax { uid: String, backtrace: Backtrace },

    #[snafu(display("Could not encode element structure"))]
    EncodeStructure {
        #[snafu(backtrace)]
        source: dcmkit_encoding::encode::Error,
    },

    #[snafu(display("Could not write value data"))]
    WriteValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Unexpected token {} in data set stream", token))]
    UnexpectedToken { token: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A writer-specific token representing a sequence or item start.
#[derive(Debug)]
struct SeqToken {
    /// Whether it is the start of a sequence or of an item.
    typ: SeqTokenType,
    /// The declared length, possibly undefined.
    len: Length,
}

/// A stateful printer of DICOM data sets from a stream of tokens.
///
/// Sequences and items with a defined length are emitted without
/// delimiters; delimited ones receive their item and sequence
/// delimitation items as mandated by the encoding rules.
/// Values of odd length are padded with the padding byte
/// of their value representation.
pub struct DataSetWriter<W, E> {
    to: W,
    encoder: E,
    seq_tokens: Vec<SeqToken>,
    last_de: Option<DataElementHeader>,
    bytes_written: u64,
}

impl<'w, W> DataSetWriter<W, DynEncoder<'w, W>>
where
    W: Write + 'w,
{
    /// Create a data set writer for the given transfer syntax.
    pub fn with_ts(to: W, ts: &TransferSyntax) -> Result<Self> {
        let encoder = ts
            .encoder_for::<W>()
            .ok_or_else(|| {
                UnsupportedWriteTransferSyntaxSnafu { uid: ts.uid() }.build()
            })?;
        Ok(DataSetWriter::new(to, encoder))
    }
}

impl<W, E> DataSetWriter<W, E> {
    /// Create a data set writer from a destination and an encoder.
    pub fn new(to: W, encoder: E) -> Self {
        DataSetWriter {
            to,
            encoder,
            seq_tokens: Vec::new(),
            last_de: None,
            bytes_written: 0,
        }
    }

    /// The number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Recover the destination.
    pub fn into_inner(self) -> W {
        self.to
    }
}

impl<W, E> DataSetWriter<W, E>
where
    W: Write,
    E: EncodeTo<W>,
{
    /// Feed the given sequence of tokens, writing the data set.
    pub fn write_sequence<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = DataToken>,
    {
        for token in tokens {
            self.write(token)?;
        }
        Ok(())
    }

    /// Feed one data set token for writing.
    #[inline]
    pub fn write(&mut self, token: DataToken) -> Result<()> {
        // defined length sequences and items do not print
        // their delimiters
        match token {
            DataToken::SequenceStart { len, .. } => {
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Sequence,
                    len,
                });
                self.write_impl(token)
            }
            DataToken::PixelSequenceStart { .. } => {
                // encapsulated pixel data is always delimited
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Sequence,
                    len: Length::UNDEFINED,
                });
                self.write_impl(token)
            }
            DataToken::ItemStart { len } => {
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Item,
                    len,
                });
                self.write_impl(token)
            }
            DataToken::ItemEnd => {
                // only written if it is a delimited item
                if let Some(seq_start) = self.seq_tokens.pop() {
                    if seq_start.typ == SeqTokenType::Item && seq_start.len.is_undefined() {
                        self.write_impl(token)?;
                    }
                }
                Ok(())
            }
            DataToken::SequenceEnd => {
                // only written if it is a delimited sequence
                if let Some(seq_start) = self.seq_tokens.pop() {
                    if seq_start.typ == SeqTokenType::Sequence && seq_start.len.is_undefined() {
                        self.write_impl(token)?;
                    }
                }
                Ok(())
            }
            DataToken::ElementHeader(de) => {
                self.last_de = Some(de);
                self.write_impl(DataToken::ElementHeader(de))
            }
            token => self.write_impl(token),
        }
    }

    fn write_impl(&mut self, token: DataToken) -> Result<()> {
        match token {
            DataToken::ElementHeader(mut header) => {
                // odd declared lengths are padded to even on write
                if let Some(len) = header.len.get() {
                    if len % 2 != 0 {
                        header.len = Length(len + 1);
                    }
                }
                let n = self
                    .encoder
                    .encode_element_header(&mut self.to, header)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += n as u64;
            }
            DataToken::SequenceStart { tag, len } => {
                let header = DataElementHeader::new(tag, VR::SQ, len);
                let n = self
                    .encoder
                    .encode_element_header(&mut self.to, header)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += n as u64;
            }
            DataToken::PixelSequenceStart { tag } => {
                let header = DataElementHeader::new(tag, VR::OB, Length::UNDEFINED);
                let n = self
                    .encoder
                    .encode_element_header(&mut self.to, header)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += n as u64;
            }
            DataToken::SequenceEnd => {
                self.encoder
                    .encode_sequence_delimiter(&mut self.to)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += 8;
            }
            DataToken::ItemStart { len } => {
                self.encoder
                    .encode_item_header(&mut self.to, len.0)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += 8;
            }
            DataToken::ItemEnd => {
                self.encoder
                    .encode_item_delimiter(&mut self.to)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += 8;
            }
            DataToken::OffsetTable(ref table) => {
                self.encoder
                    .encode_item_header(&mut self.to, table.len() as u32 * 4)
                    .context(EncodeStructureSnafu)?;
                let n = self
                    .encoder
                    .encode_offset_table(&mut self.to, table)
                    .context(EncodeStructureSnafu)?;
                self.bytes_written += 8 + n as u64;
            }
            DataToken::ItemValue(ref data) => {
                let padded = data.len() as u32 + (data.len() as u32 & 1);
                self.encoder
                    .encode_item_header(&mut self.to, padded)
                    .context(EncodeStructureSnafu)?;
                self.to.write_all(data).context(WriteValueDataSnafu)?;
                if data.len() % 2 != 0 {
                    self.to.write_all(&[0]).context(WriteValueDataSnafu)?;
                }
                self.bytes_written += 8 + u64::from(padded);
            }
            DataToken::PrimitiveValue(ref value) => {
                let header = self.last_de.take().ok_or_else(|| {
                    UnexpectedTokenSnafu {
                        token: token.to_string(),
                    }
                    .build()
                })?;
                self.write_value(&header, value)?;
            }
            DataToken::DeferredItemValue { .. }
            | DataToken::SkippedItemValue { .. }
            | DataToken::DeferredPixelValue { .. }
            | DataToken::SkippedPixelValue { .. } => {
                // deferred and skipped pixel payloads carry no bytes
                // and cannot be serialized
                return UnexpectedTokenSnafu {
                    token: token.to_string(),
                }
                .fail();
            }
        }
        Ok(())
    }

    fn write_value(&mut self, header: &DataElementHeader, value: &RawValue) -> Result<()> {
        let data = realign_value(
            header.vr,
            value.as_slice(),
            value.endianness(),
            self.encoder.endianness(),
        );
        self.to.write_all(&data).context(WriteValueDataSnafu)?;
        self.bytes_written += data.len() as u64;
        if data.len() % 2 != 0 {
            self.to
                .write_all(&[header.vr.padding()])
                .context(WriteValueDataSnafu)?;
            self.bytes_written += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::DataToken;
    use super::DataSetWriter;
    use dcmkit_core::header::{DataElementHeader, Length};
    use dcmkit_core::value::RawValue;
    use dcmkit_core::{Endianness, Tag, VR};
    use dcmkit_encoding::transfer_syntax::{EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN};

    fn validate_dataset_writer<I>(tokens: I, ground_truth: &[u8])
    where
        I: IntoIterator<Item = DataToken>,
    {
        let mut raw_out: Vec<u8> = vec![];
        let mut dset_writer =
            DataSetWriter::with_ts(&mut raw_out, &EXPLICIT_VR_LITTLE_ENDIAN).unwrap();

        dset_writer.write_sequence(tokens).unwrap();
        drop(dset_writer);

        assert_eq!(raw_out, ground_truth);
    }

    fn le_value(data: &'static [u8]) -> RawValue {
        RawValue::new(data, Endianness::Little)
    }

    #[test]
    fn write_sequence_defined() {
        let tokens = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length(46),
            },
            DataToken::ItemStart { len: Length(20) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x01, 0x00])),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6014),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x02, 0x00])),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(10) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x04, 0x00])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(le_value(b"TEST")),
        ];

        #[rustfmt::skip]
        static GROUND_TRUTH: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011)
            b'S', b'Q', 0x00, 0x00, // VR, reserved
            0x2e, 0x00, 0x00, 0x00, // length: 46
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, 0x14, 0x00, 0x00, 0x00, // item start, length 20
            // -- 20 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
            // -- 30 --
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00,
            // -- 40 --
            0xfe, 0xff, 0x00, 0xe0, 0x0a, 0x00, 0x00, 0x00, // item start, length 10
            // -- 48 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
            // -- 58 --
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000)
            b'T', b'E', b'S', b'T',
        ];

        validate_dataset_writer(tokens, GROUND_TRUTH);
    }

    #[test]
    fn write_sequence_delimited() {
        let tokens = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x01, 0x00])),
            DataToken::ItemEnd,
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x04, 0x00])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];

        #[rustfmt::skip]
        static GROUND_TRUTH: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, b'S', b'Q', 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
            0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff,
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00,
            0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff,
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00,
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00,
        ];

        validate_dataset_writer(tokens, GROUND_TRUTH);
    }

    #[test]
    fn odd_values_are_padded() {
        let tokens = vec![
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0010, 0x0020),
                vr: VR::LO,
                len: Length(5),
            }),
            DataToken::PrimitiveValue(le_value(b"ITEM1")),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x0018),
                vr: VR::UI,
                len: Length(3),
            }),
            DataToken::PrimitiveValue(le_value(b"1.2")),
        ];

        #[rustfmt::skip]
        static GROUND_TRUTH: &[u8] = &[
            // text pads with a space
            0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00,
            b'I', b'T', b'E', b'M', b'1', b' ',
            // identifiers pad with NUL
            0x08, 0x00, 0x18, 0x00, b'U', b'I', 0x04, 0x00,
            b'1', b'.', b'2', 0x00,
        ];

        validate_dataset_writer(tokens, GROUND_TRUTH);
    }

    #[test]
    fn numbers_are_realigned_to_the_profile_order() {
        let tokens = vec![
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0028, 0x0010),
                vr: VR::US,
                len: Length(2),
            }),
            // value read from a little endian source
            DataToken::PrimitiveValue(le_value(&[0x00, 0x02])),
        ];

        let mut raw_out: Vec<u8> = vec![];
        let mut dset_writer =
            DataSetWriter::with_ts(&mut raw_out, &EXPLICIT_VR_BIG_ENDIAN).unwrap();
        dset_writer.write_sequence(tokens).unwrap();
        drop(dset_writer);

        assert_eq!(
            raw_out,
            vec![0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00]
        );
    }
}
