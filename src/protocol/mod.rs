//! SONAR wire protocol.
//!
//! A record is a single-character message code, optionally followed by a
//! name field and parameter fields, each preceded by a unit separator, and
//! terminated by a record separator:
//!
//! ```text
//! <code>( US <name> ( US <param> )* )? RS
//! ```
//!
//! Fields are UTF-8 text; a lone NULL_REF code point stands for a null value.

pub mod decoder;
pub mod encoder;
pub mod message;

pub use decoder::MessageDecoder;
pub use encoder::MessageEncoder;
pub use message::{Message, MessageSet, NULL_REF, RECORD_SEP, UNIT_SEP};
