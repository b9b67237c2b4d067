//! TLS sessions driven through the ciphertext buffers only.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use sonar::common::{ConfigurationError, DebugLog, SonarError, TlsError};
use sonar::config::{load_config, parse_config, Config};
use sonar::net::{
    process_messages, Conduit, ConduitState, HandshakeStatus, NetBuffers, SecurityContext,
    SslState, TlsEngine,
};
use sonar::protocol::{Message, MessageEncoder, MessageSet};
use tempfile::TempDir;

const KEYSTORE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/keystore.pem");

fn fixture_config() -> Config {
    parse_config(&format!("keystore.file = {KEYSTORE}\n")).unwrap()
}

fn session(engine: impl TlsEngine + 'static, conduit: &ConduitState) -> SslState {
    SslState::new(
        Box::new(engine),
        Arc::new(NetBuffers::default()),
        conduit.write_signal(),
        DebugLog::SSL,
    )
    .with_handshake_wait(Duration::from_millis(1))
}

/// Move sent ciphertext from one session to the other.
fn shuttle(from: &SslState, to: &SslState) -> usize {
    let mut wire = Vec::new();
    from.net().write_to(&mut wire).unwrap();
    to.net().read_from(&mut wire.as_slice()).unwrap()
}

/// Server role which greets every login.
#[derive(Default)]
struct Greeter {
    state: ConduitState,
    logins: Vec<String>,
}

impl Conduit for Greeter {
    fn accepts(&self) -> MessageSet {
        MessageSet::SERVER
    }

    fn state(&self) -> &ConduitState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ConduitState {
        &mut self.state
    }

    fn do_login(&mut self, out: &mut MessageEncoder, params: &[String]) -> Result<(), SonarError> {
        let name = params.get(1).cloned().unwrap_or_default();
        out.encode_name(Message::Show, &format!("welcome {name}"));
        self.logins.push(name);
        Ok(())
    }
}

fn handshake(client: &mut SslState, server: &mut SslState) {
    for _ in 0..10 {
        client.do_read().unwrap();
        shuttle(client, server);
        server.do_read().unwrap();
        shuttle(server, client);
        if client.handshake_status() == HandshakeStatus::NotHandshaking
            && server.handshake_status() == HandshakeStatus::NotHandshaking
        {
            return;
        }
    }
    panic!("handshake did not complete");
}

#[test]
fn records_flow_both_ways() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    let client_conduit = ConduitState::new();
    let mut greeter = Greeter::default();
    let mut client = session(ctx.client_engine("localhost").unwrap(), &client_conduit);
    let mut server = session(ctx.server_engine().unwrap(), &greeter.state);

    handshake(&mut client, &mut server);
    assert!(client_conduit.is_write_enabled());
    assert!(greeter.state.is_write_enabled());

    client.encoder_mut().encode_params(Message::Login, "alice", &["secret"]);
    client.encoder_mut().flush().unwrap();
    assert!(client.should_write());
    client.do_write().unwrap();
    assert!(!client.encoder().has_pending());
    assert!(shuttle(&client, &server) > 0);

    process_messages(&mut greeter, &mut server, &DebugLog::TIME).unwrap();
    assert_eq!(greeter.logins, vec!["alice".to_string()]);

    assert!(shuttle(&server, &client) > 0);
    assert!(client.do_read().unwrap());
    assert_eq!(
        client.decoder_mut().decode(),
        Some(vec!["s".to_string(), "welcome alice".to_string()])
    );
    assert_eq!(client.decoder_mut().decode(), None);
}

fn connected(ctx: &SecurityContext, client: &ConduitState, server: &ConduitState) -> (SslState, SslState) {
    let mut c = session(ctx.client_engine("localhost").unwrap(), client);
    let mut s = session(ctx.server_engine().unwrap(), server);
    handshake(&mut c, &mut s);
    (c, s)
}

#[test]
fn close_delivers_pending_records_first() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    let (client_conduit, server_conduit) = (ConduitState::new(), ConduitState::new());
    let (mut client, mut server) = connected(&ctx, &client_conduit, &server_conduit);

    client.encoder_mut().encode(Message::Quit);
    client.encoder_mut().flush().unwrap();
    client.close().unwrap();
    assert!(shuttle(&client, &server) > 0);

    assert!(matches!(server.do_read(), Err(TlsError::Closed)));
    assert_eq!(server.decoder_mut().decode(), Some(vec!["q".to_string()]));
}

#[test]
fn corrupt_record_is_fatal() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    let (client_conduit, server_conduit) = (ConduitState::new(), ConduitState::new());
    let (mut client, mut server) = connected(&ctx, &client_conduit, &server_conduit);

    client.encoder_mut().encode_params(Message::Login, "alice", &["secret"]);
    client.encoder_mut().flush().unwrap();
    client.do_write().unwrap();
    let mut wire = Vec::new();
    client.net().write_to(&mut wire).unwrap();
    // flip a bit of the authentication tag
    *wire.last_mut().unwrap() ^= 0x01;
    server.net().read_from(&mut wire.as_slice()).unwrap();

    let err = server.do_read().unwrap_err();
    assert!(matches!(err, TlsError::Engine(_)), "{err:?}");
    assert!(!SonarError::from(err).is_recoverable());
    assert_eq!(server.decoder_mut().decode(), None);
}

#[test]
fn wrong_host_fails_handshake() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    let client_conduit = ConduitState::new();
    let server_conduit = ConduitState::new();
    let mut client = session(ctx.client_engine("sonar.example.com").unwrap(), &client_conduit);
    let mut server = session(ctx.server_engine().unwrap(), &server_conduit);

    let mut failed = false;
    for _ in 0..10 {
        if client.do_read().is_err() {
            failed = true;
            break;
        }
        shuttle(&client, &server);
        if server.do_read().is_err() {
            failed = true;
            break;
        }
        shuttle(&server, &client);
    }
    assert!(failed);
}

#[test]
fn context_reports_enabled_names() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    let mut protocols = ctx.protocols().to_vec();
    protocols.sort_unstable();
    assert_eq!(protocols, ["TLSv1.2", "TLSv1.3"]);
    assert!(!ctx.cipher_suites().is_empty());
    assert!(ctx.cipher_suites().iter().all(|s| s.contains("_AES_256_")));

    let mut cfg = fixture_config();
    cfg.tls.protocols = r"TLSv1\.3".into();
    let ctx = SecurityContext::new(&cfg).unwrap();
    assert_eq!(ctx.protocols(), ["TLSv1.3"]);
}

#[test]
fn invalid_names_are_rejected() {
    let ctx = SecurityContext::new(&fixture_config()).unwrap();
    assert!(matches!(
        ctx.client_engine("not a host name"),
        Err(ConfigurationError::InvalidProperty { .. })
    ));
}

#[test]
fn missing_keystore_property() {
    let err = SecurityContext::new(&Config::default()).unwrap_err();
    assert_eq!(err, ConfigurationError::MissingProperty("keystore.file".into()));
}

#[test]
fn unmatched_patterns() {
    let mut cfg = fixture_config();
    cfg.tls.protocols = "SSLv3".into();
    let err = SecurityContext::new(&cfg).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidProperty { ref name, .. } if name == "sonar.protocols"));

    let mut cfg = fixture_config();
    cfg.tls.cipher_suites = "(unclosed".into();
    let err = SecurityContext::new(&cfg).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidProperty { ref name, .. } if name == "sonar.cipher.suites"));

    // the pattern must match a whole name
    let mut cfg = fixture_config();
    cfg.tls.cipher_suites = "AES_256".into();
    assert!(SecurityContext::new(&cfg).is_err());
}

#[test]
fn keystore_errors() {
    let dir = TempDir::new().unwrap();

    let mut cfg = Config::default();
    cfg.tls.keystore_file = Some(dir.path().join("absent.pem").display().to_string());
    assert!(matches!(
        SecurityContext::new(&cfg),
        Err(ConfigurationError::Keystore(_))
    ));

    // certificates without a key
    let pem = fs::read_to_string(KEYSTORE).unwrap();
    let certs_only: String = pem
        .split_inclusive('\n')
        .take_while(|l| !l.contains("PRIVATE KEY"))
        .collect();
    let path = dir.path().join("certs.pem");
    fs::write(&path, certs_only).unwrap();
    cfg.tls.keystore_file = Some(path.display().to_string());
    let err = SecurityContext::new(&cfg).unwrap_err();
    assert!(err.to_string().contains("no private key"), "{err}");

    let path = dir.path().join("empty.pem");
    fs::write(&path, "").unwrap();
    cfg.tls.keystore_file = Some(path.display().to_string());
    let err = SecurityContext::new(&cfg).unwrap_err();
    assert!(err.to_string().contains("no certificates"), "{err}");
}

#[test]
fn properties_file_with_password() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sonar.properties");
    fs::write(
        &path,
        format!(
            "# client settings\nkeystore.file = {KEYSTORE}\nkeystore.password = changeit\n\
             sonar.host = localhost\nsonar.port = 1037\n"
        ),
    )
    .unwrap();
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.tls.keystore_password.as_deref(), Some("changeit"));
    assert_eq!(cfg.client.address().unwrap(), "localhost:1037");
    // the password is ignored for PEM keystores
    assert!(SecurityContext::new(&cfg).is_ok());
}

#[test]
fn missing_properties_file() {
    let dir = TempDir::new().unwrap();
    let err = load_config(dir.path().join("none.properties")).unwrap_err();
    assert!(matches!(err, ConfigurationError::File(_)));
}
