//! Common utilities shared across the codebase.
//!
//! - Error types for every layer
//! - Debug log channels injected into sessions

pub mod debug;
pub mod error;

// Re-export commonly used items for convenience
pub use debug::DebugLog;
pub use error::{
    cause_message, BufferOverflow, ConfigurationError, NamespaceError, ProtocolError, SonarError,
    TlsError,
};
