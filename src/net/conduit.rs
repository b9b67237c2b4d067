//! Conduits: the protocol side of a connection.
//!
//! A conduit receives decoded records and answers through the encoder of its
//! TLS session. The server and client roles accept different message sets;
//! a record outside the role's set is rejected before any handler runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::*;

use super::state::{SslState, WriteSignal};
use crate::common::{DebugLog, ProtocolError, SonarError, TlsError};
use crate::protocol::{Message, MessageEncoder, MessageSet};

/// Write interest flag shared with the TLS session.
#[derive(Debug, Default)]
pub struct WriteInterest {
    enabled: AtomicBool,
}

impl WriteInterest {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl WriteSignal for WriteInterest {
    fn enable_write(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    fn disable_write(&self) {
        self.enabled.store(false, Ordering::Release);
    }
}

/// Per-connection conduit state.
#[derive(Debug)]
pub struct ConduitState {
    connected: bool,
    write: Arc<WriteInterest>,
}

impl Default for ConduitState {
    fn default() -> Self {
        ConduitState::new()
    }
}

impl ConduitState {
    pub fn new() -> Self {
        ConduitState {
            connected: true,
            write: Arc::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Mark the conduit disconnected; it is never reconnected.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.write.disable_write();
    }

    pub fn is_write_enabled(&self) -> bool {
        self.write.is_enabled()
    }

    /// Get the signal to hand to the conduit's TLS session
    pub fn write_signal(&self) -> Arc<dyn WriteSignal> {
        self.write.clone()
    }
}

fn invalid_code() -> Result<(), SonarError> {
    Err(ProtocolError::InvalidMessageCode.into())
}

/// Message handlers of one connection role.
///
/// Every handler defaults to rejecting its message; a role overrides the
/// handlers for the messages in its `accepts` set.
pub trait Conduit {
    /// Messages this role accepts
    fn accepts(&self) -> MessageSet;

    fn state(&self) -> &ConduitState;

    fn state_mut(&mut self) -> &mut ConduitState;

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    fn disconnect(&mut self) {
        self.state_mut().disconnect();
    }

    fn do_login(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_password(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_quit(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_enumerate(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_ignore(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_object(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_remove(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_attribute(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_type(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }

    fn do_show(&mut self, _out: &mut MessageEncoder, _params: &[String]) -> Result<(), SonarError> {
        invalid_code()
    }
}

/// Dispatch one decoded record (code first) to its handler.
pub fn dispatch<C: Conduit + ?Sized>(
    conduit: &mut C,
    out: &mut MessageEncoder,
    params: &[String],
) -> Result<(), SonarError> {
    let code = params.first().ok_or(ProtocolError::InvalidMessageCode)?;
    let m = Message::lookup(code)?;
    if !conduit.accepts().accepts(m) {
        return invalid_code();
    }
    m.handle(conduit, out, params)
}

/// Decode and dispatch every record received on a TLS session.
///
/// Recoverable errors are answered with a SHOW record carrying the error
/// message. Encoded replies are flushed and wrapped before returning, on
/// success and on failure.
pub fn process_messages<C: Conduit + ?Sized>(
    conduit: &mut C,
    state: &mut SslState,
    time: &DebugLog,
) -> Result<(), SonarError> {
    let res = read_messages(conduit, state, time);
    state.encoder_mut().flush().map_err(TlsError::from)?;
    if state.should_write() {
        state.do_write()?;
    }
    res
}

fn read_messages<C: Conduit + ?Sized>(
    conduit: &mut C,
    state: &mut SslState,
    time: &DebugLog,
) -> Result<(), SonarError> {
    while conduit.is_connected() && state.do_read()? {
        while let Some(params) = state.decoder_mut().decode() {
            let start = Instant::now();
            if let Err(e) = dispatch(conduit, state.encoder_mut(), &params) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("{:?}: {}", params.first(), e);
                state.encoder_mut().encode_name(Message::Show, &e.to_string());
            }
            if time.is_open() {
                time.log(format_args!("{:?} {:?}", params.first(), start.elapsed()));
            }
            if !conduit.is_connected() {
                return Ok(());
            }
        }
    }
    Ok(())
}
