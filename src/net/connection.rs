//! Client sessions.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use log::*;
use rand::Rng;

use crate::common::{ProtocolError, SonarError, TlsError};
use crate::namespace::{Name, User};

/// Name reported for a session before login
pub const UNAUTHENTICATED: &str = "Unauthenticated";

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    /// Terminal; a disconnected session is never reused
    Disconnected,
}

/// One live client session.
#[derive(Debug)]
pub struct Connection {
    name: String,
    session_id: u64,
    user: Option<Arc<User>>,
    state: SessionState,
    watching: HashSet<String>,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.user_name())
    }
}

impl Connection {
    /// Create a session for a peer named `host:port`.
    pub fn new(name: impl Into<String>) -> Self {
        Connection {
            name: name.into(),
            session_id: rand::thread_rng().gen(),
            user: None,
            state: SessionState::Unauthenticated,
            watching: HashSet::new(),
        }
    }

    /// Create a session for a peer address.
    pub fn from_addr(addr: SocketAddr) -> Self {
        Connection::new(addr.to_string())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Disconnected
    }

    pub fn user(&self) -> Option<&Arc<User>> {
        self.user.as_ref()
    }

    /// Get the user name, or a placeholder before login
    pub fn user_name(&self) -> &str {
        self.user.as_deref().map_or(UNAUTHENTICATED, |u| u.name.as_str())
    }

    /// Record a successful login.
    pub fn login(&mut self, user: Arc<User>) -> Result<(), SonarError> {
        match self.state {
            SessionState::Unauthenticated => {
                info!("{}: login {} session {:016x}", self.name, user.name, self.session_id);
                self.user = Some(user);
                self.state = SessionState::Authenticated;
                Ok(())
            }
            SessionState::Authenticated => Err(ProtocolError::AlreadyLoggedIn.into()),
            SessionState::Disconnected => Err(TlsError::Closed.into()),
        }
    }

    /// Get the logged-in user, or fail before login.
    pub fn check_logged_in(&self) -> Result<&Arc<User>, ProtocolError> {
        self.user.as_ref().ok_or(ProtocolError::AuthenticationRequired)
    }

    /// End the session after QUIT or an I/O failure.
    pub fn disconnect(&mut self) {
        if self.state != SessionState::Disconnected {
            info!("{}: disconnect {}", self.name, self.user_name());
            self.state = SessionState::Disconnected;
            self.watching.clear();
        }
    }

    /// Start watching a name.
    ///
    /// Only type and object names become watches; watching `type//attr`
    /// clears an earlier exclusion of that attribute.
    pub fn watch(&mut self, name: &Name) {
        self.watching.remove(name.as_str());
        if name.is_type() || name.is_object() {
            self.watching.insert(name.as_str().to_string());
        }
    }

    /// Stop watching a name.
    ///
    /// Ignoring `type//attr` excludes that attribute from a type watch.
    pub fn ignore(&mut self, name: &Name) {
        self.watching.remove(name.as_str());
        if name.is_attribute() && name.object_part().is_empty() {
            self.watching.insert(name.as_str().to_string());
        }
    }

    /// Check whether changes to a name should be sent to this session.
    pub fn is_watching(&self, name: &Name) -> bool {
        if self.watching.contains(&name.object_name()) {
            return true;
        }
        if name.is_attribute() && self.watching.contains(&name.attribute_name()) {
            return false;
        }
        self.watching.contains(name.type_part())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(p: &str) -> Name {
        Name::new(p).unwrap()
    }

    #[test]
    fn lifecycle() {
        let mut c = Connection::new("10.0.0.5:40212");
        assert_eq!(c.state(), SessionState::Unauthenticated);
        assert_eq!(c.user_name(), "Unauthenticated");
        assert_eq!(c.check_logged_in().unwrap_err(), ProtocolError::AuthenticationRequired);

        let user = Arc::new(User::new("alice", None));
        c.login(user.clone()).unwrap();
        assert_eq!(c.state(), SessionState::Authenticated);
        assert_eq!(c.user_name(), "alice");
        assert_eq!(c.to_string(), "10.0.0.5:40212 (alice)");
        let err = c.login(user.clone()).unwrap_err();
        assert_eq!(err.to_string(), "Already logged in");

        c.disconnect();
        assert!(!c.is_connected());
        assert!(c.login(user).is_err());
    }

    #[test]
    fn from_socket_address() {
        let addr: SocketAddr = "192.168.1.20:1037".parse().unwrap();
        assert_eq!(Connection::from_addr(addr).name(), "192.168.1.20:1037");
    }

    #[test]
    fn watch_precedence() {
        let mut c = Connection::new("peer:1");
        c.watch(&name("camera"));
        assert!(c.is_watching(&name("camera/C1/ptz")));
        c.ignore(&name("camera//ptz"));
        assert!(c.is_watching(&name("camera/C1/video_loss")));
        // type watch minus the excluded attribute
        assert!(!c.is_watching(&name("camera/C1/ptz")));
        // an object watch wins over the exclusion
        c.watch(&name("camera/C1"));
        assert!(c.is_watching(&name("camera/C1/ptz")));
        assert!(!c.is_watching(&name("camera/C2/ptz")));
        assert!(!c.is_watching(&name("dms/V1/msg_user")));

        c.ignore(&name("camera"));
        assert!(!c.is_watching(&name("camera/C2/video_loss")));
    }

    #[test]
    fn watching_attribute_clears_exclusion() {
        let mut c = Connection::new("peer:1");
        c.watch(&name("camera"));
        c.ignore(&name("camera//ptz"));
        assert!(!c.is_watching(&name("camera/C1/ptz")));
        c.watch(&name("camera//ptz"));
        assert!(c.is_watching(&name("camera/C1/ptz")));
    }

    #[test]
    fn attribute_names_are_not_watches() {
        let mut c = Connection::new("peer:1");
        c.watch(&name("camera/C1/ptz"));
        c.watch(&name("camera//ptz"));
        assert!(!c.is_watching(&name("camera/C1/ptz")));
        // only type//attr is kept as an exclusion
        c.ignore(&name("camera/C1/ptz"));
        c.watch(&name("camera"));
        assert!(c.is_watching(&name("camera/C1/ptz")));
    }
}
