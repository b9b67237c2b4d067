//! Access control.
//!
//! A user's access level for a name is the highest level granted by any
//! permission of the user's role which covers the name. Permissions are
//! granted per base resource, optionally narrowed to objects tagged with a
//! hashtag in their notes.

use std::fmt;
use std::sync::Arc;

use super::hashtags::Hashtags;
use super::name::Name;

/// Access level, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    #[default]
    None = 0,
    View = 1,
    Operate = 2,
    Manage = 3,
    Configure = 4,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 5] = [
        AccessLevel::None,
        AccessLevel::View,
        AccessLevel::Operate,
        AccessLevel::Manage,
        AccessLevel::Configure,
    ];

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Lookup an access level from its ordinal
    pub fn from_ordinal(o: u8) -> Option<AccessLevel> {
        AccessLevel::ALL.get(usize::from(o)).copied()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessLevel::None => "none",
            AccessLevel::View => "view",
            AccessLevel::Operate => "operate",
            AccessLevel::Manage => "manage",
            AccessLevel::Configure => "configure",
        };
        f.write_str(s)
    }
}

/// Grant of an access level on a base resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub base_resource: String,
    /// Only objects with this hashtag in their notes are covered
    pub hashtag: Option<String>,
    pub access_level: AccessLevel,
}

impl Permission {
    pub fn new(base_resource: &str, access_level: AccessLevel) -> Self {
        Permission {
            base_resource: base_resource.to_string(),
            hashtag: None,
            access_level,
        }
    }

    /// Narrow the permission to objects tagged with `hashtag`.
    pub fn with_hashtag(mut self, hashtag: &str) -> Self {
        self.hashtag = Some(hashtag.to_string());
        self
    }
}

/// Named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub enabled: bool,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: &str, permissions: Vec<Permission>) -> Self {
        Role {
            name: name.to_string(),
            enabled: true,
            permissions,
        }
    }
}

/// User account as seen by access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub enabled: bool,
    pub role: Option<Arc<Role>>,
}

impl User {
    pub fn new(name: &str, role: Option<Arc<Role>>) -> Self {
        User {
            name: name.to_string(),
            enabled: true,
            role,
        }
    }

    /// Get the role, only if both user and role are enabled
    pub fn active_role(&self) -> Option<&Role> {
        self.role
            .as_deref()
            .filter(|r| self.enabled && r.enabled)
    }
}

/// Type which is never narrowed by hashtags
const HASHTAG_EXEMPT: &str = "sign_message";

/// Get the access level of a user for a name.
///
/// `notes` are the notes of the named object, if it has any.
pub fn access_level(name: &Name, user: &User, notes: Option<&str>) -> AccessLevel {
    let Some(role) = user.active_role() else {
        return AccessLevel::None;
    };
    let base = name.base_resource();
    let exempt = name.type_part() == HASHTAG_EXEMPT;
    let tags = notes.map(Hashtags::new).unwrap_or_default();
    role.permissions
        .iter()
        .filter(|p| p.base_resource == base)
        .filter(|p| match &p.hashtag {
            None => true,
            Some(tag) => exempt || tags.contains(tag),
        })
        .map(|p| p.access_level)
        .max()
        .unwrap_or_default()
}

/// Get the base resource of a type.
pub fn base_resource(type_n: &str) -> &str {
    match type_n {
        "flow_stream" => "camera",
        "font" | "graphic" | "msg_line" | "msg_pattern" | "sign_config" | "sign_detail"
        | "sign_message" | "word" => "dms",
        "gate_arm_array" => "gate_arm",
        "lcs_array" | "lcs_indication" | "lane_marking" => "lcs",
        "controller_io" => "controller",
        _ => type_n,
    }
}

/// Types writable at OPERATE
const OPERATE_TYPES: &[&str] = &["sign_message", "incident", "incident_update"];

/// Attributes writable at OPERATE, as (type, attribute)
const OPERATE_ATTRS: &[(&str, &str)] = &[
    ("beacon", "flashing"),
    ("camera", "ptz"),
    ("camera", "recall_preset"),
    ("controller", "download"),
    ("controller", "device_req"),
    ("detector", "field_length"),
    ("detector", "force_fail"),
    ("dms", "msg_user"),
    ("lane_marking", "deployed"),
    ("video_monitor", "camera"),
];

/// Types writable at MANAGE
const MANAGE_TYPES: &[&str] = &["msg_pattern", "msg_line", "word"];

/// Attributes writable at MANAGE, as (type, attribute)
const MANAGE_ATTRS: &[(&str, &str)] = &[
    ("beacon", "message"),
    ("beacon", "notes"),
    ("beacon", "preset"),
    ("camera", "store_preset"),
    ("comm_config", "timeout_ms"),
    ("comm_config", "idle_disconnect_sec"),
    ("comm_config", "no_response_disconnect_sec"),
    ("comm_link", "poll_enabled"),
    ("controller", "condition"),
    ("controller", "notes"),
    ("detector", "abandoned"),
    ("detector", "notes"),
    ("dms", "device_req"),
    ("lane_marking", "notes"),
    ("modem", "enabled"),
    ("modem", "timeout_ms"),
    ("role", "enabled"),
    ("user", "enabled"),
    ("user", "password"),
    ("weather_sensor", "site_id"),
    ("weather_sensor", "alt_id"),
    ("weather_sensor", "notes"),
];

fn listed(types: &[&str], attrs: &[(&str, &str)], type_n: &str, attr: Option<&str>) -> bool {
    types.iter().any(|t| *t == type_n)
        || attr.is_some_and(|a| attrs.iter().any(|&(t, at)| t == type_n && at == a))
}

/// Get the access level required to write a type or one of its attributes.
pub fn write_level(type_n: &str, attr: Option<&str>) -> AccessLevel {
    if listed(OPERATE_TYPES, OPERATE_ATTRS, type_n, attr) {
        AccessLevel::Operate
    } else if listed(MANAGE_TYPES, MANAGE_ATTRS, type_n, attr) {
        AccessLevel::Manage
    } else {
        AccessLevel::Configure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals() {
        for (i, lvl) in AccessLevel::ALL.iter().enumerate() {
            assert_eq!(usize::from(lvl.ordinal()), i);
            assert_eq!(AccessLevel::from_ordinal(lvl.ordinal()), Some(*lvl));
        }
        assert_eq!(AccessLevel::from_ordinal(5), None);
        assert!(AccessLevel::View < AccessLevel::Operate);
    }

    #[test]
    fn write_levels() {
        assert_eq!(write_level("camera", Some("ptz")), AccessLevel::Operate);
        assert_eq!(write_level("user", Some("password")), AccessLevel::Manage);
        assert_eq!(write_level("camera", Some("unknownAttr")), AccessLevel::Configure);
        assert_eq!(write_level("sign_message", None), AccessLevel::Operate);
        assert_eq!(write_level("word", Some("abbr")), AccessLevel::Manage);
        // attribute entries do not cover the whole type
        assert_eq!(write_level("camera", None), AccessLevel::Configure);
    }

    #[test]
    fn disabled_role_grants_nothing() {
        let mut role = Role::new("operator", vec![Permission::new("camera", AccessLevel::Operate)]);
        role.enabled = false;
        let user = User::new("alice", Some(Arc::new(role)));
        let n = Name::new("camera/C1").unwrap();
        assert_eq!(access_level(&n, &user, None), AccessLevel::None);
    }
}
