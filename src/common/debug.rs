//! Debug log channels.
//!
//! A `DebugLog` is a named channel on top of the `log` facade. Channels are
//! passed to the components that use them when those are constructed, so
//! each session can be given its own channel (or a silent one in tests).

use std::fmt::Display;

use log::{debug, log_enabled, Level};

/// Named debug log channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugLog {
    target: &'static str,
}

impl DebugLog {
    /// Channel for TLS session events
    pub const SSL: DebugLog = DebugLog::new("sonar::ssl");

    /// Channel for message dispatch
    pub const TASK: DebugLog = DebugLog::new("sonar::task");

    /// Channel for per-message elapsed time
    pub const TIME: DebugLog = DebugLog::new("sonar::time");

    /// Create a channel logging to the given target.
    pub const fn new(target: &'static str) -> Self {
        DebugLog { target }
    }

    /// Get the log target
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Check whether messages on this channel would be emitted.
    pub fn is_open(&self) -> bool {
        log_enabled!(target: self.target, Level::Debug)
    }

    /// Log a message on this channel.
    pub fn log(&self, msg: impl Display) {
        debug!(target: self.target, "{}", msg);
    }
}
