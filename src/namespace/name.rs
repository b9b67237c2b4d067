//! Namespace names.

use std::fmt;

use super::access::{self, AccessLevel};
use crate::common::NamespaceError;

/// Separator between the parts of a name
pub const SEP: char = '/';

/// Most parts a name can have: type, object and attribute
const MAX_PARTS: usize = 3;

/// Path of a type, object or attribute in the namespace.
///
/// `""` is the root, `"camera"` a type, `"camera/C1"` an object and
/// `"camera/C1/ptz"` an attribute. An attribute name with an empty object
/// part (`"camera//ptz"`) refers to the attribute across all objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    path: String,
}

impl Name {
    /// Create a name from a path.
    pub fn new(path: impl Into<String>) -> Result<Self, NamespaceError> {
        let path = path.into();
        if path.split(SEP).count() > MAX_PARTS {
            return Err(NamespaceError::NameInvalid(path));
        }
        Ok(Name { path })
    }

    /// Create the root name
    pub fn root() -> Self {
        Name { path: String::new() }
    }

    /// Create an object name.
    pub fn object(type_n: &str, obj: &str) -> Result<Self, NamespaceError> {
        Name::new(format!("{type_n}{SEP}{obj}"))
    }

    /// Create an attribute name.
    pub fn attribute(type_n: &str, obj: &str, attr: &str) -> Result<Self, NamespaceError> {
        Name::new(format!("{type_n}{SEP}{obj}{SEP}{attr}"))
    }

    /// Create an attribute name which covers every object of a type.
    pub fn type_attribute(type_n: &str, attr: &str) -> Result<Self, NamespaceError> {
        Name::attribute(type_n, "", attr)
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Get the path parts; the root has none
    pub fn parts(&self) -> Vec<&str> {
        if self.path.is_empty() {
            Vec::new()
        } else {
            self.path.split(SEP).collect()
        }
    }

    fn part(&self, i: usize) -> &str {
        if self.path.is_empty() {
            ""
        } else {
            self.path.split(SEP).nth(i).unwrap_or("")
        }
    }

    fn len(&self) -> usize {
        if self.path.is_empty() {
            0
        } else {
            self.path.split(SEP).count()
        }
    }

    pub fn is_root(&self) -> bool {
        self.len() == 0
    }

    pub fn is_type(&self) -> bool {
        self.len() == 1
    }

    pub fn is_object(&self) -> bool {
        self.len() == 2
    }

    pub fn is_attribute(&self) -> bool {
        self.len() == 3
    }

    /// Get the type part, or `""` for the root
    pub fn type_part(&self) -> &str {
        self.part(0)
    }

    /// Get the object part, or `""` if there is none
    pub fn object_part(&self) -> &str {
        self.part(1)
    }

    /// Get the attribute part, or `""` if there is none
    pub fn attribute_part(&self) -> &str {
        self.part(2)
    }

    /// Get the object name (`type/object`)
    pub fn object_name(&self) -> String {
        format!("{}{SEP}{}", self.type_part(), self.object_part())
    }

    /// Get the attribute name without the object (`type//attribute`)
    pub fn attribute_name(&self) -> String {
        format!("{}{SEP}{SEP}{}", self.type_part(), self.attribute_part())
    }

    /// Get the base resource used for permission checks
    pub fn base_resource(&self) -> &str {
        access::base_resource(self.type_part())
    }

    /// Get the access level required to write this name
    pub fn access_write(&self) -> AccessLevel {
        let type_n = self.type_part();
        let attr = self.is_attribute().then(|| self.attribute_part());
        access::write_level(type_n, attr)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl TryFrom<&str> for Name {
    type Error = NamespaceError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Name::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(p: &str) -> Name {
        Name::new(p).unwrap()
    }

    #[test]
    fn classification() {
        assert!(name("").is_root());
        assert!(name("camera").is_type());
        assert!(name("camera/C1").is_object());
        assert!(name("camera/C1/ptz").is_attribute());
        assert_eq!(name("").parts().len(), 0);
        assert_eq!(name("camera/C1/ptz").parts(), vec!["camera", "C1", "ptz"]);
    }

    #[test]
    fn derived_names() {
        let n = name("camera/C1/ptz");
        assert_eq!(n.object_name(), "camera/C1");
        assert_eq!(n.attribute_name(), "camera//ptz");
        assert_eq!(name("t/o").object_name(), "t/o");
        assert_eq!(name("t/o/a").attribute_name(), "t//a");
        assert_eq!(Name::type_attribute("t", "a").unwrap().as_str(), "t//a");
        assert_eq!(Name::object("t", "o").unwrap(), name("t/o"));
    }

    #[test]
    fn too_many_parts() {
        assert_eq!(
            Name::new("a/b/c/d"),
            Err(NamespaceError::NameInvalid("a/b/c/d".into()))
        );
        assert!(Name::new("a//c").is_ok());
    }

    #[test]
    fn empty_parts_are_kept() {
        let n = name("camera//ptz");
        assert!(n.is_attribute());
        assert_eq!(n.object_part(), "");
        assert_eq!(n.attribute_part(), "ptz");
        assert!(name("camera/").is_object());
    }

    #[test]
    fn base_resource_of_type() {
        assert_eq!(name("sign_message/M1").base_resource(), "dms");
        assert_eq!(name("flow_stream").base_resource(), "camera");
        assert_eq!(name("detector/D1/notes").base_resource(), "detector");
    }
}
