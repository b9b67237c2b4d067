//! Parameter values and their textual form.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use super::geometry::MultiPolygon;
use super::SonarObject;
use crate::protocol::NULL_REF;

/// Format of timestamps on the wire
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Primitive parameter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bool,
}

/// Domain object type referenced by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainType {
    /// Declared type name
    pub name: &'static str,
    /// Other type names tried, in order, when a lookup misses
    pub alternates: &'static [&'static str],
}

impl DomainType {
    pub const fn new(name: &'static str) -> Self {
        DomainType {
            name,
            alternates: &[],
        }
    }

    pub const fn with_alternates(name: &'static str, alternates: &'static [&'static str]) -> Self {
        DomainType { name, alternates }
    }
}

/// Type of a method parameter or attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Primitive(Primitive),
    Domain(DomainType),
    /// List of strings
    Collection,
    /// Timestamp
    Temporal,
    /// Multi-polygon
    Geometry,
    /// Array of another type, one parameter per element
    Array(&'static ParamType),
}

impl ParamType {
    pub const STRING: ParamType = ParamType::Primitive(Primitive::String);
    pub const SHORT: ParamType = ParamType::Primitive(Primitive::Short);
    pub const INT: ParamType = ParamType::Primitive(Primitive::Int);
    pub const LONG: ParamType = ParamType::Primitive(Primitive::Long);
    pub const FLOAT: ParamType = ParamType::Primitive(Primitive::Float);
    pub const DOUBLE: ParamType = ParamType::Primitive(Primitive::Double);
    pub const BOOL: ParamType = ParamType::Primitive(Primitive::Bool);

    pub fn is_array(&self) -> bool {
        matches!(self, ParamType::Array(_))
    }
}

/// Parameter or attribute value.
#[derive(Clone)]
pub enum Value {
    Null,
    String(String),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Object(Arc<dyn SonarObject>),
    List(Vec<String>),
    Timestamp(DateTime<FixedOffset>),
    Geometry(MultiPolygon),
    Array(Vec<Value>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Short(v) => f.debug_tuple("Short").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Object(o) => write!(f, "Object({}/{})", o.type_name(), o.name()),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Timestamp(v) => f.debug_tuple("Timestamp").field(v).finish(),
            Value::Geometry(v) => f.debug_tuple("Geometry").field(v).finish(),
            Value::Array(v) => f.debug_tuple("Array").field(v).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.type_name() == b.type_name() && a.name() == b.name()
            }
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Geometry(a), Value::Geometry(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the wire form of a single value.
    ///
    /// An array yields the wire form of each element; see `marshall_array`.
    pub fn marshall(&self) -> String {
        match self {
            Value::Null => NULL_REF.to_string(),
            Value::String(v) => v.clone(),
            Value::Short(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => float_text(*v),
            Value::Double(v) => float_text(*v),
            Value::Bool(v) => v.to_string(),
            Value::Object(o) => o.name().to_string(),
            Value::List(v) => format!("[{}]", v.join(", ")),
            Value::Timestamp(v) => v.format(TIMESTAMP_FORMAT).to_string(),
            Value::Geometry(v) => v.to_string(),
            Value::Array(v) => v.iter().map(Value::marshall).collect::<Vec<_>>().join(","),
        }
    }

    /// Get the wire form of a value as parameters: one per array element,
    /// otherwise exactly one.
    pub fn marshall_array(&self) -> Vec<String> {
        match self {
            Value::Array(v) => v.iter().map(Value::marshall).collect(),
            v => vec![v.marshall()],
        }
    }
}

/// Text of a floating point value, always with a fractional part.
fn float_text<F: fmt::Debug + Into<f64> + Copy>(v: F) -> String {
    let d: f64 = v.into();
    if d.is_infinite() {
        let text = if d > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{v:?}")
    }
}

impl Primitive {
    /// Parse a primitive value, or `None` if the text is not valid.
    pub fn parse(self, p: &str) -> Option<Value> {
        Some(match self {
            Primitive::String => Value::String(p.to_string()),
            Primitive::Short => Value::Short(p.parse().ok()?),
            Primitive::Int => Value::Int(p.parse().ok()?),
            Primitive::Long => Value::Long(p.parse().ok()?),
            Primitive::Float => Value::Float(p.parse().ok()?),
            Primitive::Double => Value::Double(p.parse().ok()?),
            Primitive::Bool => Value::Bool(p.eq_ignore_ascii_case("true")),
        })
    }
}

/// Parse a timestamp in wire format.
pub fn parse_timestamp(p: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(p, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn primitives() {
        assert_eq!(Primitive::Int.parse("42"), Some(Value::Int(42)));
        assert_eq!(Primitive::Short.parse("70000"), None);
        assert_eq!(Primitive::Double.parse("2.5"), Some(Value::Double(2.5)));
        assert_eq!(Primitive::Long.parse("x"), None);
        assert_eq!(Primitive::Bool.parse("TRUE"), Some(Value::Bool(true)));
        assert_eq!(Primitive::Bool.parse("yes"), Some(Value::Bool(false)));
    }

    #[test]
    fn timestamp_form() {
        let tz = FixedOffset::west_opt(6 * 3600).unwrap();
        let ts = tz.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let v = Value::Timestamp(ts);
        assert_eq!(v.marshall(), "2024-03-09T14:05:00-0600");
        assert_eq!(parse_timestamp("2024-03-09T14:05:00-0600"), Some(ts));
        assert_eq!(parse_timestamp("2024-03-09 14:05"), None);
    }

    #[test]
    fn floats_keep_fraction() {
        assert_eq!(Value::Double(2.0).marshall(), "2.0");
        assert_eq!(Value::Float(2.0).marshall(), "2.0");
        assert_eq!(Value::Double(-0.25).marshall(), "-0.25");
        assert_eq!(Value::Float(1.5).marshall(), "1.5");
        assert_eq!(Value::Double(f64::NEG_INFINITY).marshall(), "-Infinity");
        assert_eq!(Value::Double(f64::NAN).marshall(), "NaN");
        assert_eq!(Primitive::Double.parse("Infinity"), Some(Value::Double(f64::INFINITY)));
    }

    #[test]
    fn null_and_arrays() {
        assert_eq!(Value::Null.marshall(), "\u{0}");
        let arr = Value::Array(vec![Value::Int(1), Value::Null, Value::Bool(true)]);
        assert_eq!(arr.marshall_array(), vec!["1", "\u{0}", "true"]);
        assert_eq!(Value::Short(3).marshall_array(), vec!["3"]);
    }
}
