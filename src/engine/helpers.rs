use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

pub struct Helpers;

impl Helpers {
    // NULLS LAST in both directions
    pub fn cmp_json_for_sort(a: &Value, b: &Value, ascending: bool) -> Ordering {
        match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => {
                let ord = Self::cmp_values(a, b).unwrap_or_else(|| Self::type_rank(a).cmp(&Self::type_rank(b)));
                if ascending { ord } else { ord.reverse() }
            }
        }
    }

    /// Order of two non-null values of the same kind. RFC 3339 strings
    /// compare as instants when both sides parse.
    pub fn cmp_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => x.as_f64().partial_cmp(&y.as_f64()),
            },
            (Value::String(x), Value::String(y)) => match (Self::as_datetime(x), Self::as_datetime(y)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            },
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                Some(a.to_string().cmp(&b.to_string()))
            }
            _ => None,
        }
    }

    /// Equality with null equal only to null.
    pub fn value_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => a == b,
            _ => Self::cmp_values(a, b) == Some(Ordering::Equal),
        }
    }

    fn as_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(text).ok()
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}
