use crate::graph::ValueType;

/// What a resource field holds: a plain attribute or a relationship to other
/// resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Attribute { value_type: ValueType, nullable: bool },
    /// Relationship to at most one resource of `target`.
    ToOne { target: String },
    /// Relationship to any number of resources of `target`.
    ToMany { target: String },
}

/// A field as declared on one resource type.
///
/// The declaring type is not stored here: the graph keys every field by
/// `(declaring type, field name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceField {
    pub name: String,
    pub kind: FieldKind,
}

impl ResourceField {
    pub fn attribute(name: &str, value_type: ValueType, nullable: bool) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Attribute { value_type, nullable } }
    }

    pub fn to_one(name: &str, target: &str) -> Self {
        Self { name: name.to_string(), kind: FieldKind::ToOne { target: target.to_string() } }
    }

    pub fn to_many(name: &str, target: &str) -> Self {
        Self { name: name.to_string(), kind: FieldKind::ToMany { target: target.to_string() } }
    }

    pub fn is_relationship(&self) -> bool {
        !matches!(self.kind, FieldKind::Attribute { .. })
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self.kind, FieldKind::ToMany { .. })
    }

    /// Resource type name on the other side of a relationship.
    pub fn relationship_target(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::ToOne { target } | FieldKind::ToMany { target } => Some(target),
            FieldKind::Attribute { .. } => None,
        }
    }

    /// Short human-readable description used in type mismatch diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            FieldKind::Attribute { value_type, nullable: true } => format!("{value_type}?"),
            FieldKind::Attribute { value_type, nullable: false } => value_type.to_string(),
            FieldKind::ToOne { target } => format!("to-one relationship to '{target}'"),
            FieldKind::ToMany { target } => format!("to-many relationship to '{target}'"),
        }
    }
}
