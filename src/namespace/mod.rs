//! Namespace of typed objects shared with clients.
//!
//! This module contains:
//! - `name`: paths of types, objects and attributes
//! - `access`: access levels, permissions and their evaluation
//! - `hashtags`: hashtags found in object notes
//! - `marshal`: parameter types and values with their wire form
//! - `geometry`: multi-polygon values
//! - `memory`: in-memory reference registry

pub mod access;
pub mod geometry;
pub mod hashtags;
pub mod marshal;
pub mod memory;
pub mod name;

use std::fmt;
use std::sync::Arc;

pub use access::{AccessLevel, Permission, Role, User};
pub use marshal::{DomainType, ParamType, Primitive, Value};
pub use memory::{BasicObject, MemoryNamespace};
pub use name::Name;

use crate::common::{ProtocolError, SonarError};
use crate::protocol::NULL_REF;

/// Object which can be stored in a namespace.
pub trait SonarObject: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &str;

    /// Object name, unique within its type
    fn name(&self) -> &str;

    /// Administrator notes, which may contain hashtags
    fn notes(&self) -> Option<&str> {
        None
    }
}

fn is_null_ref(p: &str) -> bool {
    let mut chars = p.chars();
    chars.next() == Some(NULL_REF) && chars.next().is_none()
}

/// Registry of live objects by type.
///
/// Implementors provide lookup and iteration; value marshalling and access
/// control are built on top of those.
pub trait Namespace {
    /// Lookup an object by type and name.
    fn lookup_object(&self, type_n: &str, name: &str) -> Option<Arc<dyn SonarObject>>;

    /// Get all objects of a type
    fn iterate(&self, type_n: &str) -> Vec<Arc<dyn SonarObject>>;

    /// Count the objects of a type
    fn count(&self, type_n: &str) -> usize {
        self.iterate(type_n).len()
    }

    /// Lookup the object a name refers to
    fn lookup_name(&self, name: &Name) -> Option<Arc<dyn SonarObject>> {
        if name.is_object() || name.is_attribute() {
            self.lookup_object(name.type_part(), name.object_part())
        } else {
            None
        }
    }

    /// Get the wire form of a value.
    fn marshall(&self, value: &Value) -> String {
        value.marshall()
    }

    /// Parse one parameter.
    fn unmarshall(&self, ptype: &ParamType, p: &str) -> Result<Value, ProtocolError> {
        if is_null_ref(p) {
            return Ok(Value::Null);
        }
        let v = match ptype {
            ParamType::Primitive(k) => k.parse(p),
            ParamType::Collection => Some(Value::List(vec![p.to_string()])),
            ParamType::Temporal => marshal::parse_timestamp(p).map(Value::Timestamp),
            ParamType::Geometry => p.parse().ok().map(Value::Geometry),
            ParamType::Domain(dt) => Some(self.lookup_domain(dt, p)),
            ParamType::Array(elem) => Some(Value::Array(vec![self.unmarshall(elem, p)?])),
        };
        v.ok_or(ProtocolError::InvalidParameter)
    }

    /// Lookup a domain object, trying the alternate types on a miss.
    ///
    /// Returns `Value::Null` when no type has an object of that name.
    fn lookup_domain(&self, dt: &DomainType, p: &str) -> Value {
        self.lookup_object(dt.name, p)
            .or_else(|| dt.alternates.iter().find_map(|t| self.lookup_object(t, p)))
            .map_or(Value::Null, Value::Object)
    }

    /// Parse the parameters of one value: element-wise for an array type,
    /// otherwise exactly one.
    fn unmarshall_param(&self, ptype: &ParamType, params: &[String]) -> Result<Value, ProtocolError> {
        match ptype {
            ParamType::Array(elem) => params
                .iter()
                .map(|p| self.unmarshall(elem, p))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => match params {
                [p] => self.unmarshall(ptype, p),
                _ => Err(ProtocolError::WrongParameterCount),
            },
        }
    }

    /// Parse the parameters of a method call.
    ///
    /// A single array-typed parameter takes the whole list; otherwise there
    /// must be one parameter per type.
    fn unmarshall_params(
        &self,
        ptypes: &[ParamType],
        params: &[String],
    ) -> Result<Vec<Value>, ProtocolError> {
        if let [ptype] = ptypes {
            if ptype.is_array() {
                return Ok(vec![self.unmarshall_param(ptype, params)?]);
            }
        }
        if ptypes.len() != params.len() {
            return Err(ProtocolError::WrongParameterCount);
        }
        ptypes
            .iter()
            .zip(params)
            .map(|(t, p)| self.unmarshall(t, p))
            .collect()
    }

    /// Get the access level of a user for a name.
    fn access_level(&self, name: &Name, user: &User) -> AccessLevel {
        let obj = self.lookup_name(name);
        access::access_level(name, user, obj.as_deref().and_then(|o| o.notes()))
    }

    /// Check if a user can read a name
    fn can_read(&self, name: &Name, user: &User) -> bool {
        self.access_level(name, user) >= AccessLevel::View
    }

    /// Check if a user can write a name
    fn can_write(&self, name: &Name, user: &User) -> bool {
        self.access_level(name, user) >= name.access_write()
    }

    /// Require write access to a name.
    fn check_write(&self, name: &Name, user: &User) -> Result<(), SonarError> {
        if self.can_write(name, user) {
            Ok(())
        } else {
            Err(SonarError::PermissionDenied(name.to_string()))
        }
    }
}
