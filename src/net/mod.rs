//! Network layer for SONAR sessions.
//!
//! This module contains:
//! - `engine`: TLS record engine abstraction and the rustls engine
//! - `state`: per-connection TLS state and the shared ciphertext buffers
//! - `tls`: security context built from configuration
//! - `conduit`: message handlers and the decode/dispatch loop
//! - `connection`: client session lifecycle and watch set

pub mod conduit;
pub mod connection;
pub mod engine;
pub mod state;
pub mod tls;

pub use conduit::{dispatch, process_messages, Conduit, ConduitState, WriteInterest};
pub use connection::{Connection, SessionState};
pub use engine::{EngineResult, EngineStatus, HandshakeStatus, RustlsEngine, TlsEngine};
pub use state::{NetBuffers, SslState, WriteSignal, NET_BUFFER_SIZE};
pub use tls::SecurityContext;
