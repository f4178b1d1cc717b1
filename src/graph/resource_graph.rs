use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::graph::{ResourceField, ResourceType};

static PUBLIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-]*$").unwrap());
static ELEMENT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("invalid name '{0}'")]
    InvalidName(String),
    #[error("resource type '{0}' is registered more than once")]
    DuplicateResourceType(String),
    #[error("element type '{0}' is used by more than one resource type")]
    DuplicateElementType(String),
    #[error("resource type '{resource}' derives from unknown type '{base}'")]
    UnknownBaseType { resource: String, base: String },
    #[error("resource type '{0}' is part of an inheritance cycle")]
    CyclicInheritance(String),
    #[error("relationship '{resource}.{field}' targets unknown resource type '{target}'")]
    UnknownRelationshipTarget { resource: String, field: String, target: String },
    #[error("field '{field}' on '{resource}' is already declared in its type hierarchy")]
    DuplicateField { resource: String, field: String },
}

/// Read access to resource type metadata.
///
/// The compiler only ever talks to the graph through this trait, so any
/// catalog that can answer these lookups can drive compilation.
pub trait ResourceTypeProvider {
    fn resource_type(&self, name: &str) -> Option<&ResourceType>;

    fn resource_type_for_element(&self, element_type: &str) -> Option<&ResourceType>;

    /// Look up a field by the type that declares it. Inherited fields are
    /// only found on their declaring type.
    fn declared_field(&self, declaring_type: &str, field: &str) -> Option<&ResourceField>;

    /// Direct derived types of `name`, sorted by resource type name.
    fn derived_types(&self, name: &str) -> Vec<&ResourceType>;

    /// `name` followed by each of its ancestors, nearest first.
    fn base_chain(&self, name: &str) -> Vec<&ResourceType> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.resource_type(name);
        while let Some(resource_type) = current {
            if !seen.insert(resource_type.name.as_str()) {
                break;
            }
            chain.push(resource_type);
            current = resource_type.base_type.as_deref().and_then(|base| self.resource_type(base));
        }
        chain
    }

    /// Whether `candidate` is `base` or (transitively) derives from it.
    fn is_same_or_derived(&self, candidate: &str, base: &str) -> bool {
        self.base_chain(candidate).iter().any(|t| t.name == base)
    }
}

/// Immutable resource type catalog with an explicit
/// `(declaring type, field name)` lookup table.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    types: IndexMap<String, ResourceType>,
    by_element: HashMap<String, String>,
    fields: HashMap<(String, String), ResourceField>,
    derived: HashMap<String, Vec<String>>,
}

impl ResourceGraph {
    pub fn builder() -> ResourceGraphBuilder {
        ResourceGraphBuilder::default()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }
}

impl ResourceTypeProvider for ResourceGraph {
    fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }

    fn resource_type_for_element(&self, element_type: &str) -> Option<&ResourceType> {
        self.by_element.get(element_type).and_then(|name| self.types.get(name))
    }

    fn declared_field(&self, declaring_type: &str, field: &str) -> Option<&ResourceField> {
        self.fields.get(&(declaring_type.to_string(), field.to_string()))
    }

    fn derived_types(&self, name: &str) -> Vec<&ResourceType> {
        self.derived
            .get(name)
            .map(|names| names.iter().filter_map(|n| self.types.get(n)).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct ResourceGraphBuilder {
    types: Vec<ResourceType>,
}

impl ResourceGraphBuilder {
    pub fn add(mut self, resource_type: ResourceType) -> Self {
        self.types.push(resource_type);
        self
    }

    pub fn build(self) -> Result<ResourceGraph, GraphError> {
        let mut types: IndexMap<String, ResourceType> = IndexMap::new();
        let mut by_element = HashMap::new();

        for resource_type in self.types {
            Self::validate_names(&resource_type)?;
            if by_element.contains_key(&resource_type.element_type) {
                return Err(GraphError::DuplicateElementType(resource_type.element_type));
            }
            if types.contains_key(&resource_type.name) {
                return Err(GraphError::DuplicateResourceType(resource_type.name));
            }
            by_element.insert(resource_type.element_type.clone(), resource_type.name.clone());
            types.insert(resource_type.name.clone(), resource_type);
        }

        // base types must exist and must not form a cycle
        for resource_type in types.values() {
            let mut seen = HashSet::new();
            let mut current = resource_type;
            while let Some(base) = &current.base_type {
                if !seen.insert(current.name.as_str()) {
                    return Err(GraphError::CyclicInheritance(resource_type.name.clone()));
                }
                current = types.get(base).ok_or_else(|| GraphError::UnknownBaseType {
                    resource: current.name.clone(),
                    base: base.clone(),
                })?;
            }
        }

        let roots: HashMap<String, (String, crate::graph::ValueType)> = types
            .values()
            .map(|t| {
                let root = Self::root_of(&types, t);
                (t.name.clone(), (root.id_field.clone(), root.id_type))
            })
            .collect();

        for resource_type in types.values() {
            for field in resource_type.fields.values() {
                if let Some(target) = field.relationship_target() {
                    if !types.contains_key(target) {
                        return Err(GraphError::UnknownRelationshipTarget {
                            resource: resource_type.name.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
                let (id_field, _) = &roots[&resource_type.name];
                let redeclared = field.name == *id_field
                    || Self::ancestors(&types, resource_type)
                        .iter()
                        .any(|ancestor| ancestor.fields.contains_key(&field.name));
                if redeclared {
                    return Err(GraphError::DuplicateField {
                        resource: resource_type.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        // identity is declared once, on the root of each hierarchy
        for resource_type in types.values_mut() {
            let (id_field, id_type) = roots[&resource_type.name].clone();
            if resource_type.is_root() {
                let mut fields = IndexMap::with_capacity(resource_type.fields.len() + 1);
                fields.insert(id_field.clone(), ResourceField::attribute(&id_field, id_type, false));
                fields.extend(resource_type.fields.drain(..));
                resource_type.fields = fields;
            }
            resource_type.id_field = id_field;
            resource_type.id_type = id_type;
        }

        let mut fields = HashMap::new();
        let mut derived: HashMap<String, Vec<String>> = HashMap::new();
        for resource_type in types.values() {
            for field in resource_type.fields.values() {
                fields.insert((resource_type.name.clone(), field.name.clone()), field.clone());
            }
            if let Some(base) = &resource_type.base_type {
                derived.entry(base.clone()).or_default().push(resource_type.name.clone());
            }
        }
        for names in derived.values_mut() {
            names.sort();
        }

        tracing::debug!(types = types.len(), fields = fields.len(), "resource_graph.build");
        Ok(ResourceGraph { types, by_element, fields, derived })
    }

    fn validate_names(resource_type: &ResourceType) -> Result<(), GraphError> {
        if !PUBLIC_NAME.is_match(&resource_type.name) {
            return Err(GraphError::InvalidName(resource_type.name.clone()));
        }
        if !ELEMENT_NAME.is_match(&resource_type.element_type) {
            return Err(GraphError::InvalidName(resource_type.element_type.clone()));
        }
        for name in resource_type.fields.keys().chain(std::iter::once(&resource_type.id_field)) {
            if !PUBLIC_NAME.is_match(name) {
                return Err(GraphError::InvalidName(name.clone()));
            }
        }
        Ok(())
    }

    fn ancestors<'t>(types: &'t IndexMap<String, ResourceType>, resource_type: &ResourceType) -> Vec<&'t ResourceType> {
        let mut out = Vec::new();
        let mut current = resource_type.base_type.as_ref().and_then(|b| types.get(b));
        while let Some(base) = current {
            out.push(base);
            current = base.base_type.as_ref().and_then(|b| types.get(b));
        }
        out
    }

    fn root_of<'t>(types: &'t IndexMap<String, ResourceType>, resource_type: &'t ResourceType) -> &'t ResourceType {
        Self::ancestors(types, resource_type).last().copied().unwrap_or(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, graph::{FieldKind, ValueType}};

    #[test]
    fn test_identity_is_declared_on_root_only() {
        let graph = fixtures::blog_graph();
        let id = graph.declared_field("contentItems", "id").unwrap();
        assert_eq!(id.kind, FieldKind::Attribute { value_type: ValueType::Int, nullable: false });
        assert!(graph.declared_field("blogs", "id").is_none());
        assert_eq!(graph.resource_type("blogs").unwrap().id_field, "id");
    }

    #[test]
    fn test_identity_comes_first_in_declaration_order() {
        let graph = fixtures::blog_graph();
        let articles = graph.resource_type("articles").unwrap();
        assert_eq!(articles.fields.keys().next().map(String::as_str), Some("id"));
    }

    #[test]
    fn test_derived_types_are_sorted() {
        let graph = fixtures::blog_graph();
        let derived: Vec<_> = graph.derived_types("contentItems").iter().map(|t| t.name.clone()).collect();
        assert_eq!(derived, vec!["blogs".to_string(), "videos".to_string()]);
    }

    #[test]
    fn test_base_chain_and_assignability() {
        let graph = fixtures::blog_graph();
        let chain: Vec<_> = graph.base_chain("blogs").iter().map(|t| t.name.as_str()).collect();
        assert_eq!(chain, vec!["blogs", "contentItems"]);
        assert!(graph.is_same_or_derived("blogs", "contentItems"));
        assert!(!graph.is_same_or_derived("contentItems", "blogs"));
    }

    #[test]
    fn test_lookup_by_element_type() {
        let graph = fixtures::blog_graph();
        assert_eq!(graph.resource_type_for_element("Revision").map(|t| t.name.as_str()), Some("revisions"));
    }

    #[test]
    fn test_unknown_relationship_target_is_rejected() {
        let result = ResourceGraph::builder()
            .add(ResourceType::new("articles", "Article").to_one("author", "people"))
            .build();
        assert_eq!(result.unwrap_err(), GraphError::UnknownRelationshipTarget {
            resource: "articles".into(),
            field: "author".into(),
            target: "people".into(),
        });
    }

    #[test]
    fn test_unknown_base_is_rejected() {
        let result = ResourceGraph::builder()
            .add(ResourceType::new("blogs", "Blog").derives_from("contentItems"))
            .build();
        assert!(matches!(result, Err(GraphError::UnknownBaseType { .. })));
    }

    #[test]
    fn test_inheritance_cycle_is_rejected() {
        let result = ResourceGraph::builder()
            .add(ResourceType::new("a", "A").derives_from("b"))
            .add(ResourceType::new("b", "B").derives_from("a"))
            .build();
        assert!(matches!(result, Err(GraphError::CyclicInheritance(_))));
    }

    #[test]
    fn test_redeclared_field_is_rejected() {
        let result = ResourceGraph::builder()
            .add(ResourceType::new("contentItems", "ContentItem").attribute("title", ValueType::String))
            .add(ResourceType::new("blogs", "Blog").derives_from("contentItems").attribute("title", ValueType::String))
            .build();
        assert_eq!(result.unwrap_err(), GraphError::DuplicateField { resource: "blogs".into(), field: "title".into() });
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let result = ResourceGraph::builder().add(ResourceType::new("bad name", "Bad")).build();
        assert_eq!(result.unwrap_err(), GraphError::InvalidName("bad name".into()));

        let result = ResourceGraph::builder().add(ResourceType::new("things", "Thing").attribute("1st", ValueType::Int)).build();
        assert_eq!(result.unwrap_err(), GraphError::InvalidName("1st".into()));
    }

    #[test]
    fn test_self_referencing_relationships_are_allowed() {
        let graph = ResourceGraph::builder()
            .add(ResourceType::new("people", "Person").to_one("manager", "people").to_many("reports", "people"))
            .build()
            .unwrap();
        assert!(graph.declared_field("people", "manager").unwrap().is_relationship());
    }
}
