//! Explicit VR Little Endian encoder.

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{
    BasicEncode, Encode, Result, WriteHeaderSnafu, WriteItemDelimiterSnafu, WriteItemHeaderSnafu,
    WriteOffsetTableSnafu, WriteSequenceDelimiterSnafu, WriteTagSnafu,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use byteordered::Endianness;
use dcmkit_core::header::Header;
use dcmkit_core::{DataElementHeader, Tag};
use snafu::ResultExt;
use std::io::{self, Write};

/// A concrete encoder for the Explicit VR Little Endian
/// transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianEncoder {
    basic: LittleEndianBasicEncoder,
}

impl BasicEncode for ExplicitVRLittleEndianEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    fn encode_us<W>(&self, to: W, value: u16) -> io::Result<()>
    where
        W: Write,
    {
        self.basic.encode_us(to, value)
    }

    fn encode_ul<W>(&self, to: W, value: u32) -> io::Result<()>
    where
        W: Write,
    {
        self.basic.encode_ul(to, value)
    }

    fn encode_uv<W>(&self, to: W, value: u64) -> io::Result<()>
    where
        W: Write,
    {
        self.basic.encode_uv(to, value)
    }
}

impl Encode for ExplicitVRLittleEndianEncoder {
    fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u16(&mut buf[..], tag.group());
        LittleEndian::write_u16(&mut buf[2..], tag.element());
        to.write_all(&buf).context(WriteTagSnafu)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        if de.vr().is_long_form() {
            // two reserved zero bytes then a 32-bit length
            let mut buf = [0u8; 12];
            LittleEndian::write_u16(&mut buf[0..], de.tag().group());
            LittleEndian::write_u16(&mut buf[2..], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            // buf[6..8] is kept zero'd
            LittleEndian::write_u32(&mut buf[8..], de.len().0);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(12)
        } else {
            let mut buf = [0u8; 8];
            LittleEndian::write_u16(&mut buf[0..], de.tag().group());
            LittleEndian::write_u16(&mut buf[2..], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            LittleEndian::write_u16(&mut buf[6..], de.len().0 as u16);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(8)
        }
    }

    fn encode_item_header<W>(&self, mut to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf, 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..], 0xE000);
        LittleEndian::write_u32(&mut buf[4..], len);
        to.write_all(&buf).context(WriteItemHeaderSnafu)
    }

    fn encode_item_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf, 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..], 0xE00D);
        to.write_all(&buf).context(WriteItemDelimiterSnafu)
    }

    fn encode_sequence_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf, 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..], 0xE0DD);
        to.write_all(&buf).context(WriteSequenceDelimiterSnafu)
    }

    fn encode_offset_table<W>(&self, mut to: W, offset_table: &[u32]) -> Result<usize>
    where
        W: Write,
    {
        for v in offset_table {
            self.basic
                .encode_ul(&mut to, *v)
                .context(WriteOffsetTableSnafu)?;
        }
        Ok(offset_table.len() * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRLittleEndianEncoder;
    use crate::encode::Encode;
    use dcmkit_core::header::Length;
    use dcmkit_core::{DataElementHeader, Tag, VR};

    #[test]
    fn encode_short_form_header() {
        let mut out: Vec<u8> = Vec::new();
        let enc = ExplicitVRLittleEndianEncoder::default();
        let de = DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(8));
        let n = enc.encode_element_header(&mut out, de).unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            out,
            vec![0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00]
        );
    }

    #[test]
    fn encode_long_form_header() {
        let mut out: Vec<u8> = Vec::new();
        let enc = ExplicitVRLittleEndianEncoder::default();
        let de = DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length::UNDEFINED);
        let n = enc.encode_element_header(&mut out, de).unwrap();
        assert_eq!(n, 12);
        assert_eq!(
            out,
            vec![
                0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF
            ]
        );
    }

    #[test]
    fn encode_delimiters() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out: Vec<u8> = Vec::new();
        enc.encode_item_header(&mut out, 0xFFFF_FFFF).unwrap();
        enc.encode_item_delimiter(&mut out).unwrap();
        enc.encode_sequence_delimiter(&mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF, //
                0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, //
                0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }
}
