//! Configuration module for sonar.
//!
//! This module provides all configuration types and parsing logic:
//! - `Config` - Root configuration container
//! - `Tls` - Protocol and cipher suite filters, keystore location
//! - `Client` - Server address used by client sessions

mod parser;
mod types;

pub use parser::{load_config, parse_config};
pub use types::*;
