//! Input stream adapter over a buffer in read mode.

use std::io::{self, Read};

use super::ByteBuffer;

/// Reads the unread bytes of a `ByteBuffer` without copying it.
///
/// Every operation maps directly onto the buffer position; nothing blocks.
/// At the end of the buffered data `read` returns `Ok(0)` and `read_byte`
/// returns `None`.
pub struct BufferReader<'a> {
    buf: &'a mut ByteBuffer,
}

impl<'a> BufferReader<'a> {
    /// Wrap a buffer which is already in read mode.
    pub fn new(buf: &'a mut ByteBuffer) -> Self {
        BufferReader { buf }
    }

    /// Number of bytes readable without reaching the end
    pub fn available(&self) -> usize {
        self.buf.remaining()
    }

    /// Read one byte, or `None` at the end of buffered data.
    pub fn read_byte(&mut self) -> Option<u8> {
        let b = self.buf.chunk().first().copied()?;
        self.buf.advance(1);
        Some(b)
    }

    /// Skip up to `n` bytes, returning how many were skipped.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.buf.remaining());
        self.buf.advance(n);
        n
    }
}

impl Read for BufferReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = out.len().min(self.buf.remaining());
        out[..n].copy_from_slice(&self.buf.chunk()[..n]);
        self.buf.advance(n);
        Ok(n)
    }
}
