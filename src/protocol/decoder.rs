//! Message decoder.

use std::mem;

use super::message::{RECORD_SEP, UNIT_SEP};
use crate::buffer::{BufferReader, ByteBuffer, ReadGuard};

/// Decodes SONAR records out of the cleartext input buffer.
///
/// A record split across several reads is completed by later calls; the
/// partially decoded fields are kept in the decoder, not in the buffer.
#[derive(Debug)]
pub struct MessageDecoder {
    buf: ByteBuffer,
    param: Vec<u8>,
    params: Vec<String>,
}

impl MessageDecoder {
    /// Create a decoder with a cleartext buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        MessageDecoder {
            buf: ByteBuffer::new(capacity),
            param: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Get the cleartext input buffer (write mode)
    pub fn buffer(&self) -> &ByteBuffer {
        &self.buf
    }

    /// Get the cleartext input buffer mutably (write mode)
    pub fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buf
    }

    /// Check for buffered bytes which have not been decoded
    pub fn has_buffered(&self) -> bool {
        self.buf.position() > 0
    }

    /// Decode the next complete record.
    ///
    /// Returns the record fields with the message code first, or `None` once
    /// the buffered bytes hold no further record separator.
    pub fn decode(&mut self) -> Option<Vec<String>> {
        let MessageDecoder { buf, param, params } = self;
        let mut guard = ReadGuard::new(buf);
        let mut rd = BufferReader::new(&mut guard);
        while let Some(b) = rd.read_byte() {
            if b == RECORD_SEP as u8 {
                params.push(take_param(param));
                return Some(mem::take(params));
            } else if b == UNIT_SEP as u8 {
                params.push(take_param(param));
            } else {
                param.push(b);
            }
        }
        None
    }
}

fn take_param(param: &mut Vec<u8>) -> String {
    let p = String::from_utf8_lossy(param).into_owned();
    param.clear();
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(dec: &mut MessageDecoder, bytes: &[u8]) {
        dec.buffer_mut().put(bytes).unwrap();
    }

    #[test]
    fn decodes_code_first() {
        let mut dec = MessageDecoder::new(64);
        feed(&mut dec, b"l\x1falice\x1fsecret\x1e");
        assert_eq!(dec.decode(), Some(vec!["l".into(), "alice".into(), "secret".into()]));
        assert_eq!(dec.decode(), None);
        assert!(!dec.has_buffered());
    }

    #[test]
    fn several_records_in_one_read() {
        let mut dec = MessageDecoder::new(64);
        feed(&mut dec, b"q\x1ee\x1fcamera\x1e");
        assert_eq!(dec.decode(), Some(vec!["q".to_string()]));
        // second record still buffered, compacted to the front
        assert_eq!(dec.buffer().filled(), b"e\x1fcamera\x1e");
        assert_eq!(dec.decode(), Some(vec!["e".to_string(), "camera".to_string()]));
    }

    #[test]
    fn record_completes_on_later_read() {
        let mut dec = MessageDecoder::new(64);
        feed(&mut dec, b"o\x1fcam");
        assert_eq!(dec.decode(), None);
        assert_eq!(dec.buffer().position(), 0);
        feed(&mut dec, b"era/C1\x1e");
        assert_eq!(dec.decode(), Some(vec!["o".to_string(), "camera/C1".to_string()]));
    }

    #[test]
    fn multibyte_split_across_reads() {
        let mut dec = MessageDecoder::new(64);
        let bytes = "s\u{1f}caf\u{e9}\u{1e}".as_bytes();
        feed(&mut dec, &bytes[..5]);
        assert_eq!(dec.decode(), None);
        feed(&mut dec, &bytes[5..]);
        assert_eq!(dec.decode(), Some(vec!["s".to_string(), "caf\u{e9}".to_string()]));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut dec = MessageDecoder::new(64);
        feed(&mut dec, b"s\x1f\xff\x1e");
        assert_eq!(dec.decode(), Some(vec!["s".to_string(), "\u{fffd}".to_string()]));
    }
}
