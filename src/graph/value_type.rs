use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Declared value type of a resource attribute.
///
/// This is the coarse classification the compiler type-checks against:
/// literal constants in filters must be accepted by the attribute they are
/// compared with, and ordering operators are only valid on orderable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Boolean flag
    Bool,
    /// Integer number
    Int,
    /// Floating-point number
    Float,
    /// Text
    String,
    /// Point in time (UTC)
    DateTime,
    /// Globally unique identifier
    Uuid,
}

impl ValueType {
    /// Whether a value of type `other` can be compared against an attribute of
    /// this type without an explicit conversion.
    ///
    /// Integers widen to floats; every other pairing must match exactly.
    pub fn accepts(self, other: ValueType) -> bool {
        use ValueType::*;
        if self == other { return true; }
        matches!((self, other), (Float, Int))
    }

    /// Whether `<`, `<=`, `>` and `>=` are meaningful for this type.
    pub fn is_orderable(self) -> bool {
        !matches!(self, ValueType::Bool | ValueType::Uuid)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::DateTime => "dateTime",
            ValueType::Uuid => "uuid",
        };
        f.write_str(name)
    }
}
