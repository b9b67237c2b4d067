//! Growable output stream adapter.

use std::io::{self, Write};

use super::{ByteBuffer, Flip};

/// Smallest capacity of a growable buffer
pub const MIN_CAPACITY: usize = 1 << 10;

/// Largest capacity of a growable buffer (must stay below 2^31)
pub const MAX_CAPACITY: usize = 1 << 30;

/// Get the capacity used for a requested size.
fn capacity_for(size: usize) -> usize {
    size.checked_next_power_of_two()
        .unwrap_or(usize::MAX)
        .clamp(MIN_CAPACITY, MAX_CAPACITY)
}

/// Output stream writing into a `ByteBuffer` which grows on demand.
///
/// Capacities are always powers of two. Once all buffered bytes have been
/// consumed, `compact` drops a grown buffer and goes back to the initial
/// capacity, so a burst of traffic does not pin memory.
#[derive(Debug)]
pub struct GrowableBuffer {
    buffer: ByteBuffer,
    initial: usize,
}

impl GrowableBuffer {
    /// Create a buffer for at least `size` bytes.
    pub fn new(size: usize) -> Self {
        let initial = capacity_for(size);
        GrowableBuffer {
            buffer: ByteBuffer::new(initial),
            initial,
        }
    }

    /// Get the backing buffer
    pub fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    /// Get the backing buffer mutably
    pub fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Grow so that `required` bytes fit, keeping the written bytes.
    fn expand(&mut self, required: usize) -> io::Result<()> {
        if required > MAX_CAPACITY {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("buffer capacity exceeded: {required} bytes"),
            ));
        }
        let mut grown = ByteBuffer::new(capacity_for(required));
        // cannot overflow: grown capacity >= required > position
        grown.put(self.buffer.filled()).map_err(io::Error::other)?;
        self.buffer = grown;
        Ok(())
    }

    /// Return to write mode after reading.
    ///
    /// Unread bytes are moved to the front. With nothing left unread, a grown
    /// buffer is replaced by a fresh one of the initial capacity.
    pub fn compact(&mut self) {
        if self.buffer.has_remaining() {
            self.buffer.compact();
        } else if self.buffer.capacity() > self.initial {
            self.buffer = ByteBuffer::new(self.initial);
        } else {
            self.buffer.clear();
        }
    }
}

impl Flip for GrowableBuffer {
    fn flip(&mut self) {
        self.buffer.flip();
    }

    fn compact(&mut self) {
        GrowableBuffer::compact(self);
    }
}

impl Write for GrowableBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.buffer.remaining() {
            self.expand(self.buffer.position() + buf.len())?;
        }
        self.buffer.put(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
