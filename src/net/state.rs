//! Per-connection TLS session state.
//!
//! Ciphertext moves between the socket and `NetBuffers` in the I/O context.
//! Everything else (wrap, unwrap, encode, decode) happens in the protocol
//! context which owns the `SslState`, so only the two ciphertext buffers are
//! ever locked.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::*;

use super::engine::{EngineStatus, HandshakeStatus, TlsEngine};
use crate::buffer::{ByteBuffer, ReadGuard};
use crate::common::{DebugLog, TlsError};
use crate::protocol::{MessageDecoder, MessageEncoder};

/// Size of each ciphertext buffer and of the cleartext input buffer
pub const NET_BUFFER_SIZE: usize = 1 << 16;

/// Handshake steps taken per `do_read` call
const HANDSHAKE_STEPS: usize = 10;

/// Pause while waiting for the peer's handshake records
pub const HANDSHAKE_WAIT: Duration = Duration::from_millis(100);

/// Turns write interest on the underlying socket on or off.
pub trait WriteSignal: Send + Sync {
    fn enable_write(&self);
    fn disable_write(&self);
}

/// Ciphertext buffers shared with the network I/O context.
#[derive(Debug)]
pub struct NetBuffers {
    net_in: Mutex<ByteBuffer>,
    net_out: Mutex<ByteBuffer>,
}

impl Default for NetBuffers {
    fn default() -> Self {
        NetBuffers::new(NET_BUFFER_SIZE)
    }
}

impl NetBuffers {
    pub fn new(capacity: usize) -> Self {
        NetBuffers {
            net_in: Mutex::new(ByteBuffer::new(capacity)),
            net_out: Mutex::new(ByteBuffer::new(capacity)),
        }
    }

    /// Lock the ciphertext input buffer (write mode)
    pub fn lock_in(&self) -> MutexGuard<'_, ByteBuffer> {
        self.net_in.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the ciphertext output buffer (write mode)
    pub fn lock_out(&self) -> MutexGuard<'_, ByteBuffer> {
        self.net_out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read ciphertext from the socket into the input buffer.
    ///
    /// Returns the number of bytes read; 0 means end of stream or a full
    /// buffer.
    pub fn read_from<R: Read + ?Sized>(&self, src: &mut R) -> io::Result<usize> {
        let mut buf = self.lock_in();
        if !buf.has_remaining() {
            return Ok(0);
        }
        let n = src.read(buf.chunk_mut())?;
        buf.advance(n);
        Ok(n)
    }

    /// Write buffered ciphertext to the socket.
    ///
    /// Returns true once the output buffer is drained.
    pub fn write_to<W: Write + ?Sized>(&self, dst: &mut W) -> io::Result<bool> {
        let mut out = self.lock_out();
        let mut buf = ReadGuard::new(&mut *out);
        while buf.has_remaining() {
            match dst.write(buf.chunk()) {
                Ok(0) => break,
                Ok(n) => buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(!buf.has_remaining())
    }
}

/// TLS session state for one conduit.
pub struct SslState {
    engine: Box<dyn TlsEngine>,
    net: Arc<NetBuffers>,
    /// Ciphertext produced by one wrap
    wrap_out: ByteBuffer,
    /// Cleartext produced by one unwrap
    unwrap_out: ByteBuffer,
    encoder: MessageEncoder,
    decoder: MessageDecoder,
    signal: Arc<dyn WriteSignal>,
    debug: DebugLog,
    handshake_wait: Duration,
}

impl fmt::Debug for SslState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslState")
            .field("handshake", &self.engine.handshake_status())
            .field("pending", &self.encoder.has_pending())
            .field("buffered", &self.decoder.has_buffered())
            .finish()
    }
}

impl SslState {
    /// Create the session state for a conduit.
    pub fn new(
        engine: Box<dyn TlsEngine>,
        net: Arc<NetBuffers>,
        signal: Arc<dyn WriteSignal>,
        debug: DebugLog,
    ) -> Self {
        let scratch = engine
            .application_buffer_size()
            .max(engine.packet_buffer_size());
        SslState {
            wrap_out: ByteBuffer::new(scratch),
            unwrap_out: ByteBuffer::new(scratch),
            encoder: MessageEncoder::new(engine.application_buffer_size()),
            decoder: MessageDecoder::new(NET_BUFFER_SIZE),
            engine,
            net,
            signal,
            debug,
            handshake_wait: HANDSHAKE_WAIT,
        }
    }

    /// Set the pause used while waiting for handshake records.
    pub fn with_handshake_wait(mut self, wait: Duration) -> Self {
        self.handshake_wait = wait;
        self
    }

    pub fn net(&self) -> &Arc<NetBuffers> {
        &self.net
    }

    pub fn encoder(&self) -> &MessageEncoder {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut MessageEncoder {
        &mut self.encoder
    }

    pub fn decoder_mut(&mut self) -> &mut MessageDecoder {
        &mut self.decoder
    }

    pub fn handshake_status(&self) -> HandshakeStatus {
        self.engine.handshake_status()
    }

    /// Unwrap received ciphertext and drive the handshake.
    ///
    /// Returns true if new cleartext was added to the decoder's buffer; a
    /// partial record left from an earlier read does not count.
    pub fn do_read(&mut self) -> Result<bool, TlsError> {
        let mut produced = self.do_unwrap()?;
        for _ in 0..HANDSHAKE_STEPS {
            let status = self.engine.handshake_status();
            if self.debug.is_open() {
                self.debug.log(format_args!("handshake {:?}", status));
            }
            match status {
                HandshakeStatus::NeedTask => self.run_tasks(),
                HandshakeStatus::NeedWrap => self.do_wrap()?,
                HandshakeStatus::NeedUnwrap => {
                    produced += self.do_unwrap()?;
                    if self.engine.handshake_status() == HandshakeStatus::NeedUnwrap {
                        thread::sleep(self.handshake_wait);
                    }
                }
                HandshakeStatus::NotHandshaking => break,
            }
        }
        Ok(produced > 0)
    }

    fn run_tasks(&mut self) {
        while let Some(task) = self.engine.delegated_task() {
            task();
        }
    }

    /// Wrap pending cleartext into the ciphertext output buffer.
    fn do_wrap(&mut self) -> Result<(), TlsError> {
        let SslState {
            engine,
            net,
            wrap_out,
            encoder,
            signal,
            debug,
            ..
        } = self;
        let mut src = ReadGuard::new(encoder.buffer_mut());
        wrap_out.clear();
        let res = engine.wrap(src.buffer().chunk(), wrap_out.chunk_mut())?;
        src.buffer_mut().advance(res.consumed);
        wrap_out.advance(res.produced);
        if debug.is_open() {
            debug.log(format_args!("wrap {:?}", res));
        }
        if res.produced > 0 {
            net.lock_out().put(wrap_out.filled())?;
            signal.enable_write();
        }
        Ok(())
    }

    /// Unwrap buffered ciphertext into the decoder's cleartext buffer.
    fn do_unwrap(&mut self) -> Result<usize, TlsError> {
        let SslState {
            engine,
            net,
            unwrap_out,
            decoder,
            debug,
            ..
        } = self;
        let res = {
            let mut net_in = net.lock_in();
            let mut src = ReadGuard::new(&mut *net_in);
            let room = decoder.buffer().remaining().min(unwrap_out.capacity());
            unwrap_out.clear();
            let res = engine.unwrap(src.chunk(), &mut unwrap_out.chunk_mut()[..room])?;
            src.advance(res.consumed);
            unwrap_out.advance(res.produced);
            res
        };
        if debug.is_open() {
            debug.log(format_args!("unwrap {:?}", res));
        }
        decoder.buffer_mut().put(unwrap_out.filled())?;
        if res.status == EngineStatus::Closed {
            info!("TLS session closed by peer");
            return Err(TlsError::Closed);
        }
        Ok(res.produced)
    }

    /// Wrap pending records, then send a close notification.
    pub fn close(&mut self) -> Result<(), TlsError> {
        if self.encoder.has_pending() {
            self.do_wrap()?;
        }
        self.engine.close();
        self.do_wrap()
    }

    /// Check whether the output buffer has room for a maximal wrap
    pub fn can_write(&self) -> bool {
        self.net.lock_out().remaining() >= self.engine.packet_buffer_size()
    }

    /// Check whether encoded data is waiting and can be wrapped
    pub fn should_write(&self) -> bool {
        self.can_write() && self.encoder.has_pending()
    }

    /// Wrap pending data, or ask for write interest while output is full.
    pub fn do_write(&mut self) -> Result<(), TlsError> {
        if self.can_write() {
            self.do_wrap()
        } else {
            self.signal.enable_write();
            Ok(())
        }
    }
}
