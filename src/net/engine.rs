//! TLS record engine abstraction.
//!
//! The engine never touches a socket: `wrap` turns cleartext into ciphertext
//! records and `unwrap` turns ciphertext into cleartext, both between plain
//! byte slices. Handshake progress is reported through `handshake_status`.

use std::fmt;
use std::io::{self, Read, Write};

use log::*;

use crate::common::TlsError;

/// Largest cleartext fragment of one TLS record
pub const APPLICATION_BUFFER_SIZE: usize = 16 * 1024;

/// Room for one maximal TLS record, header and expansion included
pub const PACKET_BUFFER_SIZE: usize = APPLICATION_BUFFER_SIZE + 2048;

/// Room kept free in the output for record overhead when wrapping cleartext
const RECORD_OVERHEAD: usize = 512;

/// Outcome of one engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Ok,
    /// Peer sent close_notify
    Closed,
}

/// Result of a wrap or unwrap call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineResult {
    pub status: EngineStatus,
    /// Bytes consumed from the source
    pub consumed: usize,
    /// Bytes written to the destination
    pub produced: usize,
}

/// What the engine needs next to make handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    NeedTask,
    NeedWrap,
    NeedUnwrap,
    NotHandshaking,
}

/// Task the engine needs run before the handshake can continue
pub type DelegatedTask = Box<dyn FnOnce() + Send>;

/// Handshake and record engine.
pub trait TlsEngine: Send {
    /// Wrap cleartext from `src` into ciphertext in `dst`.
    fn wrap(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EngineResult, TlsError>;

    /// Unwrap ciphertext from `src` into cleartext in `dst`.
    fn unwrap(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EngineResult, TlsError>;

    fn handshake_status(&self) -> HandshakeStatus;

    /// Take the next pending delegated task, if any
    fn delegated_task(&mut self) -> Option<DelegatedTask>;

    /// Largest ciphertext output of a single wrap
    fn packet_buffer_size(&self) -> usize;

    /// Largest cleartext output of a single unwrap
    fn application_buffer_size(&self) -> usize;

    /// Queue a close notification for the next wrap
    fn close(&mut self) {}
}

/// Engine backed by a rustls client or server connection.
pub struct RustlsEngine {
    conn: rustls::Connection,
}

impl fmt::Debug for RustlsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.conn {
            rustls::Connection::Client(_) => "client",
            rustls::Connection::Server(_) => "server",
        };
        f.debug_struct("RustlsEngine")
            .field("side", &side)
            .field("handshaking", &self.conn.is_handshaking())
            .finish()
    }
}

impl RustlsEngine {
    pub fn new(conn: impl Into<rustls::Connection>) -> Self {
        RustlsEngine { conn: conn.into() }
    }

    /// Get the negotiated protocol version, once known
    pub fn protocol_version(&self) -> Option<rustls::ProtocolVersion> {
        self.conn.protocol_version()
    }

    /// Get the negotiated cipher suite, once known
    pub fn cipher_suite(&self) -> Option<rustls::SupportedCipherSuite> {
        self.conn.negotiated_cipher_suite()
    }

    /// Move buffered TLS records into `dst`.
    fn write_records(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let total = dst.len();
        let mut out: &mut [u8] = dst;
        while self.conn.wants_write() && !out.is_empty() {
            if self.conn.write_tls(&mut out)? == 0 {
                break;
            }
        }
        Ok(total - out.len())
    }

    /// Move received cleartext into `dst`.
    fn read_cleartext(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < dst.len() {
            match self.conn.reader().read(&mut dst[n..]) {
                Ok(0) => break,
                Ok(k) => n += k,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(n)
    }
}

impl TlsEngine for RustlsEngine {
    fn wrap(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EngineResult, TlsError> {
        // flush handshake or alert records first
        let mut produced = self.write_records(dst)?;
        let mut consumed = 0;
        let room = (dst.len() - produced).saturating_sub(RECORD_OVERHEAD);
        if !src.is_empty() && !self.conn.is_handshaking() && room > 0 {
            let n = src.len().min(room).min(APPLICATION_BUFFER_SIZE);
            consumed = self.conn.writer().write(&src[..n])?;
            produced += self.write_records(&mut dst[produced..])?;
        }
        Ok(EngineResult {
            status: EngineStatus::Ok,
            consumed,
            produced,
        })
    }

    fn unwrap(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EngineResult, TlsError> {
        let mut input = src;
        let mut produced = 0;
        let mut status = EngineStatus::Ok;
        loop {
            produced += self.read_cleartext(&mut dst[produced..])?;
            // an empty read_tls source would be taken as EOF
            if input.is_empty() || produced == dst.len() {
                break;
            }
            if self.conn.read_tls(&mut input)? == 0 {
                break;
            }
            let state = self.conn.process_new_packets().map_err(|e| {
                debug!("TLS record rejected: {}", e);
                TlsError::Engine(e)
            })?;
            if state.peer_has_closed() {
                status = EngineStatus::Closed;
            }
        }
        Ok(EngineResult {
            status,
            consumed: src.len() - input.len(),
            produced,
        })
    }

    fn handshake_status(&self) -> HandshakeStatus {
        if self.conn.wants_write() {
            HandshakeStatus::NeedWrap
        } else if self.conn.is_handshaking() {
            HandshakeStatus::NeedUnwrap
        } else {
            HandshakeStatus::NotHandshaking
        }
    }

    fn delegated_task(&mut self) -> Option<DelegatedTask> {
        // rustls does all handshake work inline
        None
    }

    fn packet_buffer_size(&self) -> usize {
        PACKET_BUFFER_SIZE
    }

    fn application_buffer_size(&self) -> usize {
        APPLICATION_BUFFER_SIZE
    }

    fn close(&mut self) {
        self.conn.send_close_notify();
    }
}
