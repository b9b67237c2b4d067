//! Configuration file parser.
//!
//! Parses Java-properties style files: one `key = value` (or `key: value`)
//! per line, `#` or `!` starting a comment line.

use std::fs;
use std::path::Path;

use log::*;

use super::types::*;
use crate::common::ConfigurationError;

/// Load configuration from a file path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigurationError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ConfigurationError::File(format!("{}: {}", path.display(), e)))?;
    parse_config(&s)
}

/// Parse configuration from a string.
pub fn parse_config(s: &str) -> Result<Config, ConfigurationError> {
    let mut cfg = Config::default();

    for (lineno, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(sep) = line.find(|c: char| c == '=' || c == ':') else {
            return Err(ConfigurationError::File(format!(
                "line {}: expected key = value",
                lineno + 1
            )));
        };
        let key = line[..sep].trim();
        let val = line[sep + 1..].trim();
        if key.is_empty() {
            return Err(ConfigurationError::File(format!("line {}: empty key", lineno + 1)));
        }

        set_config_value(key, val, &mut cfg)
            .map_err(|e| ConfigurationError::invalid(key, format!("line {}: {}", lineno + 1, e)))?;
    }

    Ok(cfg)
}

/// Set a configuration value from its property name and value strings.
fn set_config_value(key: &str, val: &str, cfg: &mut Config) -> Result<(), String> {
    macro_rules! parse {
        (s) => {
            val.to_string()
        };
        (opt) => {
            if val.is_empty() {
                None
            } else {
                Some(val.to_string())
            }
        };
        (u16_) => {
            val.parse::<u16>().map_err(|e| format!("bad port {val}: {e}"))?
        };
    }

    match key {
        PROTOCOLS_PROP => cfg.tls.protocols = parse!(s),
        CIPHER_SUITES_PROP => cfg.tls.cipher_suites = parse!(s),
        KEYSTORE_FILE_PROP => cfg.tls.keystore_file = parse!(opt),
        KEYSTORE_PASSWORD_PROP => cfg.tls.keystore_password = parse!(opt),
        HOST_PROP => cfg.client.host = parse!(opt),
        PORT_PROP => cfg.client.port = Some(parse!(u16_)),
        _ => debug!("ignoring unknown property: {}", key),
    }

    Ok(())
}
