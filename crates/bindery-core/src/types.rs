//! Declared types and the adapters that connect them to nodes.
//!
//! A bound function declares the type of each parameter and of its result.
//! The result type decides how the raw return value reaches the target node:
//! either the function already produces the node's native state, or the
//! value goes through the node's adapter for that type ([`TypeName::adapter`]).
//!
//! # Invariants
//!
//! 1. Every non-native, non-`any` type has exactly one adapter.
//! 2. Wire names are stable: `parse(wire_name(t)) == Some(t)`.
//! 3. Coercion never changes a value that already has the declared type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::node::NodeKind;
use crate::value::Value;

/// Closed set of declared parameter and result types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeName {
    Str,
    Int,
    Float,
    Bool,
    List,
    Table,
    DateTime,
    /// No declared type; values pass through untouched.
    Any,
    /// The native state of a node kind.
    Node(NodeKind),
}

/// Conversion operation a node kind implements to consume a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Adapter {
    FromString,
    FromInt,
    FromFloat,
    FromBool,
    FromList,
    FromTable,
    FromDateTime,
}

impl Adapter {
    /// Operation name as exposed by node kinds (`fromString`, `fromInt`, ...).
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::FromString => "fromString",
            Self::FromInt => "fromInt",
            Self::FromFloat => "fromFloat",
            Self::FromBool => "fromBool",
            Self::FromList => "fromList",
            Self::FromTable => "fromTable",
            Self::FromDateTime => "fromDateTime",
        }
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// A value could not be converted to a declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    pub expected: TypeName,
    pub found: &'static str,
    pub detail: Option<String>,
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.found, self.expected)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CoercionError {}

impl TypeName {
    /// Parse a wire/source type name. Lower-case keywords name value types;
    /// a capitalised identifier names a node kind.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name {
            "str" => Self::Str,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "list" => Self::List,
            "table" => Self::Table,
            "datetime" => Self::DateTime,
            "any" => Self::Any,
            other => {
                let mut chars = other.chars();
                let first = chars.next()?;
                if first.is_ascii_uppercase() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    Self::Node(NodeKind::new(other))
                } else {
                    return None;
                }
            }
        };
        Some(ty)
    }

    #[must_use]
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Table => "table",
            Self::DateTime => "datetime",
            Self::Any => "any",
            Self::Node(kind) => kind.as_str(),
        }
    }

    /// The adapter a node needs to consume this type as a result.
    #[must_use]
    pub const fn adapter(&self) -> Option<Adapter> {
        match self {
            Self::Str => Some(Adapter::FromString),
            Self::Int => Some(Adapter::FromInt),
            Self::Float => Some(Adapter::FromFloat),
            Self::Bool => Some(Adapter::FromBool),
            Self::List => Some(Adapter::FromList),
            Self::Table => Some(Adapter::FromTable),
            Self::DateTime => Some(Adapter::FromDateTime),
            Self::Any | Self::Node(_) => None,
        }
    }

    /// Whether this type is the native state of `kind`.
    #[must_use]
    pub fn is_native_for(&self, kind: &NodeKind) -> bool {
        matches!(self, Self::Node(k) if k == kind)
    }

    /// Convert `value` to this type.
    ///
    /// str, int and float are interconvertible; `null` passes through so that
    /// optional parameters keep their absence. Artifact references are not
    /// resolved here.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        if value.is_null() {
            return Ok(value);
        }
        match (self, value) {
            (Self::Any | Self::Node(_), v) => Ok(v),

            (Self::Str, Value::Str(s)) => Ok(Value::Str(s)),
            (Self::Str, Value::Table(_)) => Err(self.mismatch("table", None)),
            (Self::Str, v) => Ok(Value::Str(v.to_string())),

            (Self::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (Self::Int, Value::Float(f)) => {
                // 2^63 is exact in f64; i64::MAX is not.
                const LIMIT: f64 = 9_223_372_036_854_775_808.0;
                let t = f.trunc();
                if !f.is_finite() {
                    Err(self.mismatch("float", Some(format!("{f} is not finite"))))
                } else if t < -LIMIT || t >= LIMIT {
                    Err(self.mismatch("float", Some(format!("{f} is outside the int range"))))
                } else {
                    Ok(Value::Int(t as i64))
                }
            }
            (Self::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (Self::Int, Value::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| self.mismatch("str", Some(format!("{s:?}: {e}")))),
            (Self::Int, Value::DateTime(ns)) => Ok(Value::Int(ns)),

            (Self::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (Self::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (Self::Float, Value::Bool(b)) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
            (Self::Float, Value::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| self.mismatch("str", Some(format!("{s:?}: {e}")))),

            (Self::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Self::Bool, Value::Int(i)) => Ok(Value::Bool(i != 0)),
            (Self::Bool, Value::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(self.mismatch("str", Some(format!("{s:?}")))),
            },

            (Self::List, Value::List(items)) => Ok(Value::List(items)),
            (Self::List, Value::Table(table)) => Ok(Value::List(
                table.rows().iter().cloned().map(Value::List).collect(),
            )),

            (Self::Table, Value::Table(t)) => Ok(Value::Table(t)),

            (Self::DateTime, Value::DateTime(ns)) => Ok(Value::DateTime(ns)),
            (Self::DateTime, Value::Int(ns)) => Ok(Value::DateTime(ns)),

            (_, other) => Err(self.mismatch(other.type_label(), None)),
        }
    }

    fn mismatch(&self, found: &'static str, detail: Option<String>) -> CoercionError {
        CoercionError {
            expected: self.clone(),
            found,
            detail,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for TypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TypeName::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown type name '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_keywords_and_kinds() {
        assert_eq!(TypeName::parse("int"), Some(TypeName::Int));
        assert_eq!(
            TypeName::parse("Slider"),
            Some(TypeName::Node(NodeKind::new("Slider")))
        );
        assert_eq!(TypeName::parse("integer"), None);
        assert_eq!(TypeName::parse(""), None);
        assert_eq!(TypeName::parse("Bad-Kind"), None);
    }

    #[test]
    fn every_value_type_has_an_adapter() {
        for ty in [
            TypeName::Str,
            TypeName::Int,
            TypeName::Float,
            TypeName::Bool,
            TypeName::List,
            TypeName::Table,
            TypeName::DateTime,
        ] {
            assert!(ty.adapter().is_some(), "{ty} has no adapter");
        }
        assert_eq!(TypeName::Any.adapter(), None);
        assert_eq!(TypeName::Node(NodeKind::new("Text")).adapter(), None);
    }

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(TypeName::Int.coerce(Value::from(" 42 ")), Ok(Value::Int(42)));
        assert_eq!(TypeName::Float.coerce(Value::from("2.5")), Ok(Value::Float(2.5)));
        assert_eq!(TypeName::Str.coerce(Value::Int(7)), Ok(Value::from("7")));
        assert_eq!(TypeName::Int.coerce(Value::Float(3.9)), Ok(Value::Int(3)));
    }

    #[test]
    fn bad_coercions_report_found_type() {
        let err = TypeName::Int.coerce(Value::List(vec![])).unwrap_err();
        assert_eq!(err.found, "list");
        assert_eq!(err.expected, TypeName::Int);
        assert!(TypeName::Int.coerce(Value::from("abc")).is_err());
        assert!(TypeName::Int.coerce(Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn out_of_range_floats_do_not_saturate() {
        let err = TypeName::Int.coerce(Value::Float(1e19)).unwrap_err();
        assert_eq!(err.found, "float");
        assert!(TypeName::Int.coerce(Value::Float(-1e19)).is_err());
        assert!(TypeName::Int.coerce(Value::Float(9_223_372_036_854_775_808.0)).is_err());
        assert_eq!(
            TypeName::Int.coerce(Value::Float(-9_223_372_036_854_775_808.0)),
            Ok(Value::Int(i64::MIN))
        );
        assert_eq!(TypeName::Int.coerce(Value::Float(-2.7)), Ok(Value::Int(-2)));
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(TypeName::Int.coerce(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&TypeName::DateTime).unwrap();
        assert_eq!(json, "\"datetime\"");
        let kind: TypeName = serde_json::from_str("\"Slider\"").unwrap();
        assert_eq!(kind, TypeName::Node(NodeKind::new("Slider")));
        assert!(serde_json::from_str::<TypeName>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn int_to_str_and_back(i in any::<i64>()) {
            let s = TypeName::Str.coerce(Value::Int(i)).unwrap();
            prop_assert_eq!(TypeName::Int.coerce(s).unwrap(), Value::Int(i));
        }

        #[test]
        fn coercion_is_identity_on_matching_type(i in any::<i64>(), s in ".*") {
            prop_assert_eq!(TypeName::Int.coerce(Value::Int(i)).unwrap(), Value::Int(i));
            prop_assert_eq!(TypeName::Str.coerce(Value::Str(s.clone())).unwrap(), Value::Str(s));
        }
    }
}
