use indexmap::IndexMap;

use crate::graph::{ResourceField, ValueType};

/// Metadata for one resource type, as exposed by the resource graph.
///
/// - `name`: the public resource type name (e.g. `articles`), used by query
///   layers and relationship targets.
/// - `element_type`: the name of the element type the compiled expression
///   ranges over (e.g. `Article`); range variables are derived from it.
/// - `base_type`: the resource type this one derives from, if any.
/// - `fields`: fields declared by this type only, in declaration order.
///   Inherited fields live on the base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    pub name: String,
    pub element_type: String,
    pub base_type: Option<String>,
    pub id_field: String,
    pub id_type: ValueType,
    pub fields: IndexMap<String, ResourceField>,
}

impl ResourceType {
    pub fn new(name: &str, element_type: &str) -> Self {
        Self {
            name: name.to_string(),
            element_type: element_type.to_string(),
            base_type: None,
            id_field: "id".to_string(),
            id_type: ValueType::Int,
            fields: IndexMap::new(),
        }
    }

    /// Declare this type as derived from `base`. Derived types inherit the
    /// identity field and every field of their base chain.
    pub fn derives_from(mut self, base: &str) -> Self {
        self.base_type = Some(base.to_string());
        self
    }

    pub fn with_id(mut self, id_field: &str, id_type: ValueType) -> Self {
        self.id_field = id_field.to_string();
        self.id_type = id_type;
        self
    }

    pub fn attribute(self, name: &str, value_type: ValueType) -> Self {
        self.field(ResourceField::attribute(name, value_type, false))
    }

    pub fn nullable_attribute(self, name: &str, value_type: ValueType) -> Self {
        self.field(ResourceField::attribute(name, value_type, true))
    }

    pub fn to_one(self, name: &str, target: &str) -> Self {
        self.field(ResourceField::to_one(name, target))
    }

    pub fn to_many(self, name: &str, target: &str) -> Self {
        self.field(ResourceField::to_many(name, target))
    }

    pub fn field(mut self, field: ResourceField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn is_root(&self) -> bool {
        self.base_type.is_none()
    }
}
