//! Message encoder.

use std::io::{self, Write};

use bytes::{BufMut, BytesMut};

use super::message::{Message, RECORD_SEP, UNIT_SEP};
use crate::buffer::GrowableBuffer;

/// Encodes SONAR records into a growable cleartext buffer.
///
/// Records are staged in memory and only become visible to the TLS layer
/// after `flush`.
#[derive(Debug)]
pub struct MessageEncoder {
    staging: BytesMut,
    out: GrowableBuffer,
}

impl MessageEncoder {
    /// Create an encoder with room for at least `size` cleartext bytes.
    pub fn new(size: usize) -> Self {
        MessageEncoder {
            staging: BytesMut::with_capacity(256),
            out: GrowableBuffer::new(size),
        }
    }

    /// Encode a record without a name.
    pub fn encode(&mut self, m: Message) {
        self.put_code(m);
        self.staging.put_u8(RECORD_SEP as u8);
    }

    /// Encode a record with a name field.
    pub fn encode_name(&mut self, m: Message, name: &str) {
        self.put_code(m);
        self.put_field(name);
        self.staging.put_u8(RECORD_SEP as u8);
    }

    /// Encode a record with a name field and parameters.
    pub fn encode_params<S: AsRef<str>>(&mut self, m: Message, name: &str, params: &[S]) {
        self.put_code(m);
        self.put_field(name);
        for p in params {
            self.put_field(p.as_ref());
        }
        self.staging.put_u8(RECORD_SEP as u8);
    }

    fn put_code(&mut self, m: Message) {
        let mut code = [0u8; 4];
        self.staging.put_slice(m.code().encode_utf8(&mut code).as_bytes());
    }

    /// Put a unit separator followed by a field with separators blanked out.
    fn put_field(&mut self, field: &str) {
        self.staging.put_u8(UNIT_SEP as u8);
        for b in field.bytes() {
            // separators are ASCII, so this never splits a UTF-8 sequence
            if b == RECORD_SEP as u8 || b == UNIT_SEP as u8 {
                self.staging.put_u8(b' ');
            } else {
                self.staging.put_u8(b);
            }
        }
    }

    /// Move staged records into the output buffer.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.staging.is_empty() {
            self.out.write_all(&self.staging)?;
            self.staging.clear();
        }
        Ok(())
    }

    /// Check for flushed bytes which have not been wrapped yet
    pub fn has_pending(&self) -> bool {
        self.out.buffer().position() > 0
    }

    /// Number of staged bytes not yet flushed
    pub fn staged(&self) -> usize {
        self.staging.len()
    }

    /// Get the output buffer
    pub fn buffer(&self) -> &GrowableBuffer {
        &self.out
    }

    /// Get the output buffer mutably
    pub fn buffer_mut(&mut self) -> &mut GrowableBuffer {
        &mut self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flushed(enc: &mut MessageEncoder) -> Vec<u8> {
        enc.flush().unwrap();
        enc.buffer().buffer().filled().to_vec()
    }

    #[test]
    fn record_layouts() {
        let mut enc = MessageEncoder::new(0);
        enc.encode(Message::Quit);
        enc.encode_name(Message::Enumerate, "camera");
        enc.encode_params(Message::Login, "alice", &["secret"]);
        assert_eq!(
            flushed(&mut enc),
            b"q\x1e\
              e\x1fcamera\x1e\
              l\x1falice\x1fsecret\x1e"
                .to_vec()
        );
    }

    #[test]
    fn separators_are_blanked() {
        let mut enc = MessageEncoder::new(0);
        enc.encode_params(Message::Attribute, "dms/V1/msg", &["a\u{1e}b\u{1f}c"]);
        assert_eq!(flushed(&mut enc), b"a\x1fdms/V1/msg\x1fa b c\x1e".to_vec());
    }

    #[test]
    fn pending_only_after_flush() {
        let mut enc = MessageEncoder::new(0);
        enc.encode(Message::Quit);
        assert!(!enc.has_pending());
        assert_eq!(enc.staged(), 2);
        enc.flush().unwrap();
        assert!(enc.has_pending());
        assert_eq!(enc.staged(), 0);
    }
}
