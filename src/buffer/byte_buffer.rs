//! Fixed-capacity byte buffer with explicit read and write modes.

use crate::common::BufferOverflow;

/// Fixed-capacity byte buffer.
///
/// In write mode, bytes `[0, position)` hold data and `[position, limit)` is
/// free space (`limit == capacity`). After `flip` the buffer is in read mode:
/// `[position, limit)` are the unread bytes. `compact` returns to write mode,
/// keeping any unread bytes at the front.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Box<[u8]>,
    position: usize,
    limit: usize,
}

impl ByteBuffer {
    /// Allocate a buffer in write mode.
    pub fn new(capacity: usize) -> Self {
        ByteBuffer {
            data: vec![0; capacity].into_boxed_slice(),
            position: 0,
            limit: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes between position and limit
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Switch from write mode to read mode.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Switch from read mode to write mode, moving unread bytes to the front.
    pub fn compact(&mut self) {
        let n = self.remaining();
        self.data.copy_within(self.position..self.limit, 0);
        self.position = n;
        self.limit = self.capacity();
    }

    /// Discard everything and return to write mode.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Append bytes at the position; all or nothing.
    pub fn put(&mut self, src: &[u8]) -> Result<(), BufferOverflow> {
        let remaining = self.remaining();
        if src.len() > remaining {
            return Err(BufferOverflow {
                needed: src.len(),
                remaining,
            });
        }
        self.data[self.position..self.position + src.len()].copy_from_slice(src);
        self.position += src.len();
        Ok(())
    }

    /// Bytes between position and limit.
    pub fn chunk(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Mutable bytes between position and limit.
    pub fn chunk_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.position..self.limit]
    }

    /// Bytes before the position (the data written so far in write mode).
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.position]
    }

    /// Move the position forward by `n` bytes (clamped to the limit).
    pub fn advance(&mut self, n: usize) {
        self.position = (self.position + n).min(self.limit);
    }
}
