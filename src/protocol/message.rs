//! SONAR message vocabulary.

use bitflags::bitflags;

use crate::common::{ProtocolError, SonarError};
use crate::net::conduit::Conduit;
use crate::protocol::MessageEncoder;

/// Record separator: ends a message
pub const RECORD_SEP: char = '\u{1e}';

/// Unit separator: ends one field of a message
pub const UNIT_SEP: char = '\u{1f}';

/// Null reference: inline null parameter value
pub const NULL_REF: char = '\u{0}';

/// SONAR message command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    /// Client login request
    Login,
    /// Client password change request
    Password,
    /// Quit (either direction)
    Quit,
    /// Client enumerate request
    Enumerate,
    /// Client ignore request
    Ignore,
    /// Object create request (client) / object listing (server)
    Object,
    /// Object remove request (client) / removal notice (server)
    Remove,
    /// Attribute set request (client) / change notice (server)
    Attribute,
    /// Type enumeration marker (server)
    Type,
    /// Show text (server)
    Show,
}

bitflags! {
    /// Set of messages a conduit role accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageSet: u16 {
        const LOGIN     = 1 << 0;
        const PASSWORD  = 1 << 1;
        const QUIT      = 1 << 2;
        const ENUMERATE = 1 << 3;
        const IGNORE    = 1 << 4;
        const OBJECT    = 1 << 5;
        const REMOVE    = 1 << 6;
        const ATTRIBUTE = 1 << 7;
        const TYPE      = 1 << 8;
        const SHOW      = 1 << 9;
    }
}

impl MessageSet {
    /// Messages a server accepts from a client connection
    pub const SERVER: Self = Self::LOGIN
        .union(Self::PASSWORD)
        .union(Self::QUIT)
        .union(Self::ENUMERATE)
        .union(Self::IGNORE)
        .union(Self::OBJECT)
        .union(Self::REMOVE)
        .union(Self::ATTRIBUTE);

    /// Messages a client accepts from the server
    pub const CLIENT: Self = Self::QUIT
        .union(Self::OBJECT)
        .union(Self::REMOVE)
        .union(Self::ATTRIBUTE)
        .union(Self::TYPE)
        .union(Self::SHOW);

    /// Check whether a message is in the set
    pub fn accepts(self, m: Message) -> bool {
        self.contains(m.flag())
    }
}

impl Message {
    /// All messages, in code order
    pub const ALL: [Message; 10] = [
        Message::Login,
        Message::Password,
        Message::Quit,
        Message::Enumerate,
        Message::Ignore,
        Message::Object,
        Message::Remove,
        Message::Attribute,
        Message::Type,
        Message::Show,
    ];

    /// Get the wire code
    pub const fn code(self) -> char {
        match self {
            Message::Login => 'l',
            Message::Password => 'p',
            Message::Quit => 'q',
            Message::Enumerate => 'e',
            Message::Ignore => 'i',
            Message::Object => 'o',
            Message::Remove => 'r',
            Message::Attribute => 'a',
            Message::Type => 't',
            Message::Show => 's',
        }
    }

    /// Lookup a message from its wire code
    pub fn from_code(code: char) -> Option<Message> {
        Message::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Lookup a message from the first parameter of a decoded record.
    ///
    /// The code parameter must be exactly one character.
    pub fn lookup(code: &str) -> Result<Message, ProtocolError> {
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Message::from_code(c).ok_or(ProtocolError::InvalidMessageCode),
            _ => Err(ProtocolError::InvalidMessageCode),
        }
    }

    /// Get the flag for this message in a `MessageSet`
    pub const fn flag(self) -> MessageSet {
        match self {
            Message::Login => MessageSet::LOGIN,
            Message::Password => MessageSet::PASSWORD,
            Message::Quit => MessageSet::QUIT,
            Message::Enumerate => MessageSet::ENUMERATE,
            Message::Ignore => MessageSet::IGNORE,
            Message::Object => MessageSet::OBJECT,
            Message::Remove => MessageSet::REMOVE,
            Message::Attribute => MessageSet::ATTRIBUTE,
            Message::Type => MessageSet::TYPE,
            Message::Show => MessageSet::SHOW,
        }
    }

    /// Call the conduit handler for this message.
    pub fn handle<C: Conduit + ?Sized>(
        self,
        conduit: &mut C,
        out: &mut MessageEncoder,
        params: &[String],
    ) -> Result<(), SonarError> {
        match self {
            Message::Login => conduit.do_login(out, params),
            Message::Password => conduit.do_password(out, params),
            Message::Quit => conduit.do_quit(out, params),
            Message::Enumerate => conduit.do_enumerate(out, params),
            Message::Ignore => conduit.do_ignore(out, params),
            Message::Object => conduit.do_object(out, params),
            Message::Remove => conduit.do_remove(out, params),
            Message::Attribute => conduit.do_attribute(out, params),
            Message::Type => conduit.do_type(out, params),
            Message::Show => conduit.do_show(out, params),
        }
    }
}
