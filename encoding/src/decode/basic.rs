//! Basic binary number decoding under either byte order.

use super::BasicDecode;
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use std::io::{self, Read};

/// A basic decoder for little-endian encoded sources.
#[derive(Debug, Default, Clone)]
pub struct LittleEndianBasicDecoder;

impl BasicDecode for LittleEndianBasicDecoder {
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    fn decode_us<S>(&self, mut source: S) -> io::Result<u16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn decode_ul<S>(&self, mut source: S) -> io::Result<u32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn decode_uv<S>(&self, mut source: S) -> io::Result<u64>
    where
        S: Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u64(&buf))
    }
}

/// A basic decoder for big-endian encoded sources.
#[derive(Debug, Default, Clone)]
pub struct BigEndianBasicDecoder;

impl BasicDecode for BigEndianBasicDecoder {
    fn endianness(&self) -> Endianness {
        Endianness::Big
    }

    fn decode_us<S>(&self, mut source: S) -> io::Result<u16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    fn decode_ul<S>(&self, mut source: S) -> io::Result<u32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    fn decode_uv<S>(&self, mut source: S) -> io::Result<u64>
    where
        S: Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf)?;
        Ok(BigEndian::read_u64(&buf))
    }
}

/// A basic decoder with its byte order resolved at run time.
#[derive(Debug, Clone)]
pub enum BasicDecoder {
    /// Decode numbers in little endian.
    LE(LittleEndianBasicDecoder),
    /// Decode numbers in big endian.
    BE(BigEndianBasicDecoder),
}

impl From<Endianness> for BasicDecoder {
    fn from(endianness: Endianness) -> Self {
        match endianness {
            Endianness::Little => BasicDecoder::LE(LittleEndianBasicDecoder),
            Endianness::Big => BasicDecoder::BE(BigEndianBasicDecoder),
        }
    }
}

macro_rules! for_both {
    ($s:expr, |$e:ident| $f:expr) => {
        match $s {
            BasicDecoder::LE($e) => $f,
            BasicDecoder::BE($e) => $f,
        }
    };
}

impl BasicDecode for BasicDecoder {
    fn endianness(&self) -> Endianness {
        for_both!(self, |d| d.endianness())
    }

    fn decode_us<S>(&self, source: S) -> io::Result<u16>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_us(source))
    }

    fn decode_ul<S>(&self, source: S) -> io::Result<u32>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_ul(source))
    }

    fn decode_uv<S>(&self, source: S) -> io::Result<u64>
    where
        S: Read,
    {
        for_both!(self, |d| d.decode_uv(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_in_either_order() {
        let data = [0x02, 0x00, 0x00, 0x00];
        let le = BasicDecoder::from(Endianness::Little);
        let be = BasicDecoder::from(Endianness::Big);
        assert_eq!(le.decode_us(&data[..]).unwrap(), 2);
        assert_eq!(be.decode_us(&data[..]).unwrap(), 0x0200);
        assert_eq!(le.decode_ul(&data[..]).unwrap(), 2);
        assert_eq!(be.decode_ul(&data[..]).unwrap(), 0x0200_0000);
    }
}
