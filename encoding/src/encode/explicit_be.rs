//! Explicit VR Big Endian encoder (retired coding, kept writable).

use crate::encode::basic::BigEndianBasicEncoder;
use crate::encode::{
    BasicEncode, Encode, Result, WriteHeaderSnafu, WriteItemDelimiterSnafu, WriteItemHeaderSnafu,
    WriteOffsetTableSnafu, WriteSequenceDelimiterSnafu, WriteTagSnafu,
};
use byteordered::byteorder::{BigEndian, ByteOrder};
use byteordered::Endianness;
use dcmkit_core::header::Header;
use dcmkit_core::{DataElementHeader, Tag};
use snafu::ResultExt;
use std::io::{self, Write};

/// A concrete encoder for the Explicit VR Big Endian
/// transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRBigEndianEncoder {
    basic: BigEndianBasicEncoder,
}

impl BasicEncode for ExplicitVRBigEndianEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Big
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

impl Encode for ExplicitVRBigEndianEncoder {
    fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        BigEndian::write_u16(&mut buf[..], tag.group());
        BigEndian::write_u16(&mut buf[2..], tag.element());
        to.write_all(&buf).context(WriteTagSnafu)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        if de.vr().is_long_form() {
            let mut buf = [0u8; 12];
            BigEndian::write_u16(&mut buf[0..], de.tag().group());
            BigEndian::write_u16(&mut buf[2..], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            // buf[6..8] is kept zero'd
            BigEndian::write_u32(&mut buf[8..], de.len().0);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(12)
        } else {
            let mut buf = [0u8; 8];
            BigEndian::write_u16(&mut buf[0..], de.tag().group());
            BigEndian::write_u16(&mut buf[2..], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            BigEndian::write_u16(&mut buf[6..], de.len().0 as u16);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(8)
        }
    }

    fn encode_item_header<W>(&self, mut to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf, 0xFFFE);
        BigEndian::write_u16(&mut buf[2..], 0xE000);
        BigEndian::write_u32(&mut buf[4..], len);
        to.write_all(&buf).context(WriteItemHeaderSnafu)
    }

    fn encode_item_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf, 0xFFFE);
        BigEndian::write_u16(&mut buf[2..], 0xE00D);
        to.write_all(&buf).context(WriteItemDelimiterSnafu)
    }

    fn encode_sequence_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf, 0xFFFE);
        BigEndian::write_u16(&mut buf[2..], 0xE0DD);
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
    use super::ExplicitVRBigEndianEncoder;
    use crate::encode::Encode;
    use dcmkit_core::header::Length;
    use dcmkit_core::{DataElementHeader, Tag, VR};

    #[test]
    fn encode_big_endian_header() {
        let mut out: Vec<u8> = Vec::new();
        let enc = ExplicitVRBigEndianEncoder::default();
        let de = DataElementHeader::new(Tag(0x0028, 0x0010), VR::US, Length(2));
        let n = enc.encode_element_header(&mut out, de).unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, vec![0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02]);
    }
}
