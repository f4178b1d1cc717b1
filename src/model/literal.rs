use chrono::{DateTime, SecondsFormat, Utc};
use ordered_float::NotNan;
use serde_json::Value;
use std::fmt::{self, Display};
use uuid::Uuid;

use crate::graph::ValueType;

/// A constant appearing in a filter, already converted by the external parser
/// to the type of the attribute it is compared with.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(NotNan<f64>),
    String(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

impl Literal {
    pub fn string(value: &str) -> Self {
        Literal::String(value.to_string())
    }

    /// Returns `None` for NaN.
    pub fn float(value: f64) -> Option<Self> {
        NotNan::new(value).ok().map(Literal::Float)
    }

    /// Declared type of this constant; `None` for null.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Literal::Null => None,
            Literal::Bool(_) => Some(ValueType::Bool),
            Literal::Int(_) => Some(ValueType::Int),
            Literal::Float(_) => Some(ValueType::Float),
            Literal::String(_) => Some(ValueType::String),
            Literal::DateTime(_) => Some(ValueType::DateTime),
            Literal::Uuid(_) => Some(ValueType::Uuid),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// JSON representation, as stored by document sources.
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::Float(f) => serde_json::Number::from_f64(f.into_inner()).map(Value::Number).unwrap_or(Value::Null),
            Literal::String(s) => Value::String(s.clone()),
            Literal::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Literal::Uuid(u) => Value::String(u.to_string()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(n) => write!(f, "{}", n.into_inner()),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::DateTime(dt) => write!(f, "DateTime({})", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Literal::Uuid(u) => write!(f, "Uuid({u})"),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "Null"),
            Literal::Bool(_) => write!(f, "Bool({})", self),
            Literal::Int(_) => write!(f, "Int({})", self),
            Literal::Float(_) => write!(f, "Float({})", self),
            Literal::String(_) => write!(f, "String({})", self),
            Literal::DateTime(_) => write!(f, "{}", self),
            Literal::Uuid(_) => write!(f, "{}", self),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self { Literal::Bool(value) }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self { Literal::Int(value) }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self { Literal::string(value) }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self { Literal::DateTime(value) }
}

impl From<Uuid> for Literal {
    fn from(value: Uuid) -> Self { Literal::Uuid(value) }
}
