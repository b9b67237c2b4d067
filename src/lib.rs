#![deny(clippy::all)]
#![warn(unused_crate_dependencies)]

pub mod buffer;
pub mod common;
pub mod config;
pub mod namespace;
pub mod net;
pub mod protocol;
