use std::fmt::{self, Display};

use indexmap::IndexMap;

use crate::model::{FilterExpression, IncludeExpression, PaginationExpression, SortExpression};

/// Requested fields of a resource. Attributes map to `None`; a relationship
/// may map to a nested layer applied within that relationship.
pub type Projection = IndexMap<String, Option<QueryLayer>>;

/// One compile unit: everything requested of one resource type.
///
/// Built once per request by the parser and only read afterwards; absent
/// clauses impose no constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLayer {
    pub resource_type: String,
    pub include: Option<IncludeExpression>,
    pub filter: Option<FilterExpression>,
    pub sort: Option<SortExpression>,
    pub pagination: Option<PaginationExpression>,
    pub projection: Option<Projection>,
}

impl QueryLayer {
    pub fn new(resource_type: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            include: None,
            filter: None,
            sort: None,
            pagination: None,
            projection: None,
        }
    }

    pub fn with_include(mut self, include: IncludeExpression) -> Self {
        self.include = Some(include);
        self
    }

    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortExpression) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationExpression) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Project `fields` without nested layers.
    pub fn select(self, fields: &[&str]) -> Self {
        let projection = fields.iter().map(|f| (f.to_string(), None)).collect();
        self.with_projection(projection)
    }

    /// Add (or replace) one projected field carrying a nested layer.
    pub fn select_nested(mut self, field: &str, layer: QueryLayer) -> Self {
        self.projection.get_or_insert_with(IndexMap::new).insert(field.to_string(), Some(layer));
        self
    }

    /// Projection when present and non-empty.
    pub fn effective_projection(&self) -> Option<&Projection> {
        self.projection.as_ref().filter(|p| !p.is_empty())
    }

    pub fn is_identity(&self) -> bool {
        self.include.is_none()
            && self.filter.is_none()
            && self.sort.is_none()
            && self.pagination.is_none()
            && self.effective_projection().is_none()
    }
}

impl Display for QueryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryLayer<{}>", self.resource_type)?;
        let mut parts: Vec<String> = Vec::new();
        if let Some(include) = &self.include {
            parts.push(format!("include: {include}"));
        }
        if let Some(filter) = &self.filter {
            parts.push(format!("filter: {filter}"));
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("sort: {sort}"));
        }
        if let Some(pagination) = &self.pagination {
            parts.push(format!("pagination: {pagination}"));
        }
        if let Some(projection) = self.effective_projection() {
            let fields: Vec<String> = projection
                .iter()
                .map(|(name, layer)| match layer {
                    Some(layer) => format!("{name}: {layer}"),
                    None => name.clone(),
                })
                .collect();
            parts.push(format!("projection: {{ {} }}", fields.join(", ")));
        }
        if !parts.is_empty() {
            write!(f, " {{ {} }}", parts.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layer_is_identity() {
        assert!(QueryLayer::new("articles").is_identity());
        assert!(QueryLayer::new("articles").with_projection(Projection::new()).is_identity());
        assert!(!QueryLayer::new("articles").select(&["title"]).is_identity());
    }

    #[test]
    fn test_display() {
        let layer = QueryLayer::new("articles")
            .select(&["title"])
            .select_nested(
                "revisions",
                QueryLayer::new("revisions")
                    .with_filter(FilterExpression::equals("isPublished", true))
                    .with_pagination(PaginationExpression::take(3))
                    .select(&["title"]),
            );
        assert_eq!(
            layer.to_string(),
            "QueryLayer<articles> { projection: { title, revisions: QueryLayer<revisions> { filter: equals(isPublished,true); pagination: skip=0,take=3; projection: { title } } } }"
        );
    }

    #[test]
    fn test_projection_equality_ignores_insertion_order() {
        let a = QueryLayer::new("articles").select(&["title", "caption"]);
        let b = QueryLayer::new("articles").select(&["caption", "title"]);
        assert_eq!(a, b);
    }
}
