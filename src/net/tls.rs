//! TLS security context.
//!
//! Builds rustls client and server configurations from the sonar
//! properties: protocol versions and cipher suites are filtered by regular
//! expressions, and the keystore is a PEM file holding the certificate chain
//! followed by the private key.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use log::*;
use regex::Regex;
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{
    ClientConfig, ClientConnection, ProtocolVersion, RootCertStore, ServerConfig,
    ServerConnection, SupportedCipherSuite, SupportedProtocolVersion,
};

use super::engine::RustlsEngine;
use crate::common::ConfigurationError;
use crate::config::{Config, CIPHER_SUITES_PROP, HOST_PROP, PROTOCOLS_PROP};

/// Get the name of a protocol version as used in configuration.
fn protocol_name(v: &SupportedProtocolVersion) -> Option<&'static str> {
    match v.version {
        ProtocolVersion::TLSv1_2 => Some("TLSv1.2"),
        ProtocolVersion::TLSv1_3 => Some("TLSv1.3"),
        _ => None,
    }
}

/// Get the name of a cipher suite as used in configuration.
fn suite_name(suite: &SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

/// Compile a property pattern which must match a whole name.
fn full_match(prop: &str, pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| ConfigurationError::invalid(prop, e.to_string()))
}

fn filter_protocols(
    pattern: &str,
) -> Result<Vec<&'static SupportedProtocolVersion>, ConfigurationError> {
    let re = full_match(PROTOCOLS_PROP, pattern)?;
    let versions: Vec<_> = rustls::ALL_VERSIONS
        .iter()
        .copied()
        .filter(|v| protocol_name(v).is_some_and(|n| re.is_match(n)))
        .collect();
    if versions.is_empty() {
        return Err(ConfigurationError::invalid(
            PROTOCOLS_PROP,
            format!("no protocol matches {pattern}"),
        ));
    }
    Ok(versions)
}

fn filter_suites(provider: &mut CryptoProvider, pattern: &str) -> Result<(), ConfigurationError> {
    let re = full_match(CIPHER_SUITES_PROP, pattern)?;
    provider.cipher_suites.retain(|s| re.is_match(&suite_name(s)));
    if provider.cipher_suites.is_empty() {
        return Err(ConfigurationError::invalid(
            CIPHER_SUITES_PROP,
            format!("no cipher suite matches {pattern}"),
        ));
    }
    Ok(())
}

/// Load the certificate chain and private key from a PEM keystore.
fn load_keystore(
    path: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), ConfigurationError> {
    let file = File::open(path).map_err(|e| {
        ConfigurationError::Keystore(format!("{}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);
    let mut certs = Vec::new();
    let mut key = None;
    for item in rustls_pemfile::read_all(&mut reader) {
        match item.map_err(|e| ConfigurationError::keystore(&e))? {
            rustls_pemfile::Item::X509Certificate(cert) => certs.push(cert),
            rustls_pemfile::Item::Pkcs1Key(k) if key.is_none() => key = Some(PrivateKeyDer::Pkcs1(k)),
            rustls_pemfile::Item::Pkcs8Key(k) if key.is_none() => key = Some(PrivateKeyDer::Pkcs8(k)),
            rustls_pemfile::Item::Sec1Key(k) if key.is_none() => key = Some(PrivateKeyDer::Sec1(k)),
            _ => continue,
        }
    }
    if certs.is_empty() {
        return Err(ConfigurationError::Keystore(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    let key = key.ok_or_else(|| {
        ConfigurationError::Keystore(format!("no private key found in {}", path.display()))
    })?;
    Ok((certs, key))
}

/// TLS configuration shared by every session of a process.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    protocols: Vec<&'static str>,
    suites: Vec<String>,
    server: Arc<ServerConfig>,
    client: Arc<ClientConfig>,
}

impl SecurityContext {
    /// Build the context from configuration.
    pub fn new(cfg: &Config) -> Result<Self, ConfigurationError> {
        let versions = filter_protocols(&cfg.tls.protocols)?;
        let mut provider = ring::default_provider();
        filter_suites(&mut provider, &cfg.tls.cipher_suites)?;
        let provider = Arc::new(provider);

        let keystore = cfg.keystore_file()?;
        if cfg.tls.keystore_password.is_some() {
            warn!("keystore.password ignored: PEM keystore {} is not encrypted", keystore);
        }
        let (certs, key) = load_keystore(Path::new(keystore))?;

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs.iter().cloned());
        debug!("trusting {} keystore certificates ({} ignored)", added, ignored);
        if added == 0 {
            return Err(ConfigurationError::Keystore(format!(
                "no usable certificates in {keystore}"
            )));
        }

        let server = ServerConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(&versions)
            .map_err(|e| ConfigurationError::provider(&e))?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| ConfigurationError::keystore(&e))?;

        let client = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(&versions)
            .map_err(|e| ConfigurationError::provider(&e))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let protocols: Vec<_> = versions.iter().filter_map(|v| protocol_name(v)).collect();
        let suites: Vec<_> = provider.cipher_suites.iter().map(suite_name).collect();
        info!("TLS protocols: {}", protocols.join(", "));
        info!("TLS cipher suites: {}", suites.join(", "));

        Ok(SecurityContext {
            protocols,
            suites,
            server: Arc::new(server),
            client: Arc::new(client),
        })
    }

    /// Get the enabled protocol names
    pub fn protocols(&self) -> &[&'static str] {
        &self.protocols
    }

    /// Get the enabled cipher suite names
    pub fn cipher_suites(&self) -> &[String] {
        &self.suites
    }

    pub fn server_config(&self) -> &Arc<ServerConfig> {
        &self.server
    }

    pub fn client_config(&self) -> &Arc<ClientConfig> {
        &self.client
    }

    /// Create an engine for an accepted connection.
    pub fn server_engine(&self) -> Result<RustlsEngine, ConfigurationError> {
        let conn = ServerConnection::new(self.server.clone())
            .map_err(|e| ConfigurationError::provider(&e))?;
        Ok(RustlsEngine::new(conn))
    }

    /// Create an engine for a connection to `host`.
    pub fn client_engine(&self, host: &str) -> Result<RustlsEngine, ConfigurationError> {
        let name = ServerName::try_from(host.to_string())
            .map_err(|e| ConfigurationError::invalid(HOST_PROP, e.to_string()))?;
        let conn = ClientConnection::new(self.client.clone(), name)
            .map_err(|e| ConfigurationError::provider(&e))?;
        Ok(RustlsEngine::new(conn))
    }
}
