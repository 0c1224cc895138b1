//! Basic binary number encoding under either byte order.

use super::BasicEncode;
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use std::io::{self, Write};

/// A basic encoder for little-endian destinations.
#[derive(Debug, Default, Clone)]
pub struct LittleEndianBasicEncoder;

impl BasicEncode for LittleEndianBasicEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    fn encode_us<W>(&self, mut to: W, value: u16) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        to.write_all(&buf)
    }

    fn encode_ul<W>(&self, mut to: W, value: u32) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        to.write_all(&buf)
    }

    fn encode_uv<W>(&self, mut to: W, value: u64) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        to.write_all(&buf)
    }
}

/// A basic encoder for big-endian destinations.
#[derive(Debug, Default, Clone)]
pub struct BigEndianBasicEncoder;

impl BasicEncode for BigEndianBasicEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Big
    }

    fn encode_us<W>(&self, mut to: W, value: u16) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        to.write_all(&buf)
    }

    fn encode_ul<W>(&self, mut to: W, value: u32) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        to.write_all(&buf)
    }

    fn encode_uv<W>(&self, mut to: W, value: u64) -> io::Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, value);
        to.write_all(&buf)
    }
}
