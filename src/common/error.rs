//! Unified error types for the sonar codebase.
//!
//! Errors are split into disjoint families:
//! - `ConfigurationError`: raised while building a session; fatal to it
//! - `ProtocolError`: raised while decoding/dispatching; the record is rejected
//! - `NamespaceError`: raised by registry operations; reported to the client
//! - `TlsError`: raised by the record engine; fatal to the session
//!
//! `SonarError` wraps every family for code that can fail in more than one way.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Get the message of the innermost cause of an error.
///
/// Falls back to the type name of `err` itself (a `dyn Error` source does not
/// expose its own) when the innermost message is empty, so the result is never
/// an empty string.
pub fn cause_message<E: StdError + 'static>(err: &E) -> String {
    let mut inner: &(dyn StdError + 'static) = err;
    while let Some(src) = inner.source() {
        inner = src;
    }
    let msg = inner.to_string();
    if msg.is_empty() {
        std::any::type_name::<E>().to_string()
    } else {
        msg
    }
}

/// Configuration error: missing or invalid property, keystore or provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A required property was not set
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// A property value could not be used
    #[error("Invalid property: {name}: {reason}")]
    InvalidProperty {
        /// Property name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// The properties file itself could not be read or parsed
    #[error("{0}")]
    File(String),

    /// Keystore unreadable or without usable entries
    #[error("Keystore error: {0}")]
    Keystore(String),

    /// Security provider refused the configuration
    #[error("Security provider error: {0}")]
    Provider(String),
}

impl ConfigurationError {
    /// Create an invalid property error
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidProperty {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a keystore error from a cause
    pub fn keystore<E: StdError + 'static>(err: &E) -> Self {
        ConfigurationError::Keystore(cause_message(err))
    }

    /// Create a provider error from a cause
    pub fn provider<E: StdError + 'static>(err: &E) -> Self {
        ConfigurationError::Provider(cause_message(err))
    }
}

/// Protocol error: the offending record is rejected, the connection stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid message code")]
    InvalidMessageCode,
    #[error("Wrong parameter count")]
    WrongParameterCount,
    #[error("Invalid parameter")]
    InvalidParameter,
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Already logged in")]
    AlreadyLoggedIn,
}

/// Namespace error: always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("Invalid name: {0}")]
    NameInvalid(String),
    #[error("Name already exists: {0}")]
    NameExists(String),
    #[error("Unknown name: {0}")]
    NameUnknown(String),
}

/// Error raised when a buffer has no room for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Buffer overflow: {needed} bytes needed, {remaining} remaining")]
pub struct BufferOverflow {
    pub needed: usize,
    pub remaining: usize,
}

/// TLS layer error: fatal to the session.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Engine rejected input (bad MAC, corrupt record, handshake failure)
    #[error("{}", cause_message(.0))]
    Engine(#[from] rustls::Error),

    /// I/O error while moving records through the engine
    #[error("{}", cause_message(.0))]
    Io(#[from] io::Error),

    /// Ciphertext did not fit into a session buffer
    #[error(transparent)]
    Overflow(#[from] BufferOverflow),

    /// Peer closed the TLS session
    #[error("TLS session closed")]
    Closed,
}

/// Any error raised while processing a SONAR session.
#[derive(Debug, Error)]
pub enum SonarError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// User lacks the access level required for a name
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Tls(#[from] TlsError),
}

impl SonarError {
    /// Check if the error can be reported to the peer without disconnecting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SonarError::Protocol(_) | SonarError::Namespace(_) | SonarError::PermissionDenied(_)
        )
    }
}
