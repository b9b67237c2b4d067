//! Configuration type definitions.

use crate::common::ConfigurationError;

/// Property naming the enabled TLS protocols (regex)
pub const PROTOCOLS_PROP: &str = "sonar.protocols";

/// Property naming the enabled cipher suites (regex)
pub const CIPHER_SUITES_PROP: &str = "sonar.cipher.suites";

/// Property naming the PEM keystore file
pub const KEYSTORE_FILE_PROP: &str = "keystore.file";

/// Property holding the keystore password
pub const KEYSTORE_PASSWORD_PROP: &str = "keystore.password";

pub const HOST_PROP: &str = "sonar.host";
pub const PORT_PROP: &str = "sonar.port";

/// TLS configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tls {
    /// Pattern matched against protocol names (`TLSv1.2`, `TLSv1.3`)
    pub protocols: String,
    /// Pattern matched against cipher suite names
    pub cipher_suites: String,
    pub keystore_file: Option<String>,
    pub keystore_password: Option<String>,
}

impl Default for Tls {
    fn default() -> Self {
        Self {
            protocols: r"TLSv1\.[23]".into(),
            cipher_suites: ".*_AES_256_.*".into(),
            keystore_file: None,
            keystore_password: None,
        }
    }
}

/// Client connection settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Client {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Client {
    /// Get the server address as `host:port`.
    pub fn address(&self) -> Result<String, ConfigurationError> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingProperty(HOST_PROP.into()))?;
        let port = self
            .port
            .ok_or_else(|| ConfigurationError::MissingProperty(PORT_PROP.into()))?;
        Ok(format!("{host}:{port}"))
    }
}

/// Root configuration container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub tls: Tls,
    pub client: Client,
}

impl Config {
    /// Get the keystore file, which is required for any TLS session.
    pub fn keystore_file(&self) -> Result<&str, ConfigurationError> {
        self.tls
            .keystore_file
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingProperty(KEYSTORE_FILE_PROP.into()))
    }
}
