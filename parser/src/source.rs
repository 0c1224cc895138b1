//! Byte sources for the stateful decoder.
//!
//! A byte source is a reader which can additionally hand out
//! value data as [`Bytes`] handles.
//! For in-memory sources the handles alias the source buffer,
//! giving the zero-copy read path;
//! stream-backed sources produce owned buffers instead.

use bytes::{Bytes, BytesMut};
use std::io::{self, Read};

/// A source of bytes for data set parsing.
///
/// Element and item headers are read through the [`Read`]
/// implementation; value data goes through [`read_value`]
/// so that in-memory sources can alias their buffer.
///
/// [`read_value`]: ByteSource::read_value
pub trait ByteSource: Read {
    /// Read exactly `len` bytes of value data.
    fn read_value(&mut self, len: usize) -> io::Result<Bytes>;

    /// Advance past `len` bytes without retaining them.
    fn skip_value(&mut self, len: u64) -> io::Result<()>;
}

impl<T: ?Sized> ByteSource for &mut T
where
    T: ByteSource,
{
    fn read_value(&mut self, len: usize) -> io::Result<Bytes> {
        (**self).read_value(len)
    }

    fn skip_value(&mut self, len: u64) -> io::Result<()> {
        (**self).skip_value(len)
    }
}

fn eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "premature end of data")
}

/// A byte source over an in-memory buffer.
/// Value reads are O(1) slices aliasing the buffer.
#[derive(Debug, Clone)]
pub struct BytesSource {
    data: Bytes,
    pos: usize,
}

impl BytesSource {
    /// Create a source over the given buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        BytesSource {
            data: data.into(),
            pos: 0,
        }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl Read for BytesSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl ByteSource for BytesSource {
    fn read_value(&mut self, len: usize) -> io::Result<Bytes> {
        if len > self.remaining() {
            return Err(eof());
        }
        let out = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(out)
    }

    fn skip_value(&mut self, len: u64) -> io::Result<()> {
        if len > self.remaining() as u64 {
            return Err(eof());
        }
        self.pos += len as usize;
        Ok(())
    }
}

/// A byte source over an arbitrary reader.
/// Value reads copy into owned buffers.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    /// Create a source over the given reader.
    pub fn new(inner: R) -> Self {
        ReaderSource { inner }
    }

    /// Recover the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_value(&mut self, len: usize) -> io::Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        self.inner.read_exact(&mut buf)?;
        Ok(buf.freeze())
    }

    fn skip_value(&mut self, len: u64) -> io::Result<()> {
        let copied = io::copy(&mut self.inner.by_ref().take(len), &mut io::sink())?;
        if copied < len {
            return Err(eof());
        }
        Ok(())
    }
}
