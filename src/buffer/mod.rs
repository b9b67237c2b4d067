//! Byte buffers and the stream adapters built on them.
//!
//! - `byte_buffer`: fixed-capacity buffer with read/write modes
//! - `input`: `Read` adapter over a buffer in read mode
//! - `output`: `Write` adapter over a buffer that grows on demand
//!
//! `ReadGuard` is how every user of a shared buffer reads from it: the buffer
//! is flipped when the guard is created and compacted back to write mode when
//! it is dropped, whichever way the reading code exits.

mod byte_buffer;
mod input;
mod output;

pub use byte_buffer::ByteBuffer;
pub use input::BufferReader;
pub use output::{GrowableBuffer, MAX_CAPACITY, MIN_CAPACITY};

use std::ops::{Deref, DerefMut};

/// A buffer which can switch between write mode and read mode.
pub trait Flip {
    /// Switch to read mode
    fn flip(&mut self);

    /// Switch back to write mode, keeping unread bytes
    fn compact(&mut self);
}

impl Flip for ByteBuffer {
    fn flip(&mut self) {
        ByteBuffer::flip(self);
    }

    fn compact(&mut self) {
        ByteBuffer::compact(self);
    }
}

/// Holds a buffer in read mode for the guard's lifetime.
pub struct ReadGuard<'a, B: Flip> {
    buf: &'a mut B,
}

impl<'a, B: Flip> ReadGuard<'a, B> {
    /// Flip `buf` to read mode until the guard is dropped.
    pub fn new(buf: &'a mut B) -> Self {
        buf.flip();
        ReadGuard { buf }
    }
}

impl<B: Flip> Deref for ReadGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.buf
    }
}

impl<B: Flip> DerefMut for ReadGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.buf
    }
}

impl<B: Flip> Drop for ReadGuard<'_, B> {
    fn drop(&mut self) {
        self.buf.compact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consume_then_fail(buf: &mut ByteBuffer) -> Result<(), &'static str> {
        let mut rd = ReadGuard::new(buf);
        rd.advance(2);
        Err("failed mid-read")
    }

    #[test]
    fn guard_compacts_on_error_path() {
        let mut buf = ByteBuffer::new(8);
        buf.put(b"abcd").unwrap();
        assert!(consume_then_fail(&mut buf).is_err());
        // back in write mode with the unread bytes in front
        assert_eq!(buf.limit(), buf.capacity());
        assert_eq!(buf.filled(), b"cd");
        buf.put(b"ef").unwrap();
        assert_eq!(buf.filled(), b"cdef");
    }
}
