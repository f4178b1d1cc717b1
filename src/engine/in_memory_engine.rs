use serde_json::{Map, Value};

use crate::{
    engine::{EngineError, Materializer, MemoryStore, PlanExecutor, TYPE_TAG},
    graph::{FieldKind, ResourceTypeProvider},
    plan::QueryExpr,
};

/// Reference execution engine for compiled queries.
///
/// Resources are inserted under their concrete resource type; each object
/// (and each embedded related object) is tagged with that type so type tests
/// and casts can be answered at run time.
pub struct InMemoryEngine<'g> {
    graph: &'g dyn ResourceTypeProvider,
    store: MemoryStore,
}

impl<'g> InMemoryEngine<'g> {
    pub fn new(graph: &'g dyn ResourceTypeProvider) -> Self {
        Self { graph, store: MemoryStore::new() }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn into_store(self) -> MemoryStore {
        self.store
    }

    pub fn insert(&self, resource_type: &str, item: Value) -> Result<(), EngineError> {
        if self.graph.resource_type(resource_type).is_none() {
            return Err(EngineError::UnknownResourceType(resource_type.to_string()));
        }
        let tagged = self.tag(item, resource_type)?;
        self.store.insert(resource_type, tagged)
    }

    /// Load `{ "<resource type>": [ { ... }, ... ], ... }`, returning the
    /// number of resources inserted.
    pub fn load_json(&self, text: &str) -> Result<usize, EngineError> {
        let document: Map<String, Value> = serde_json::from_str(text)?;
        let mut count = 0;
        for (resource_type, items) in document {
            let Value::Array(items) = items else {
                return Err(EngineError::InvalidData(format!("'{resource_type}' must map to an array of resources")));
            };
            for item in items {
                self.insert(&resource_type, item)?;
                count += 1;
            }
        }
        tracing::debug!(resources = count, "engine.load");
        Ok(count)
    }

    pub fn execute(&self, query: &QueryExpr) -> Result<Vec<Value>, EngineError> {
        let rows = PlanExecutor::new(self.graph, &self.store).run(query)?;
        let out = Materializer::new(self.graph).rows(rows, query)?;
        tracing::debug!(rows = out.len(), "engine.execute");
        Ok(out)
    }

    /// Tag `item` with its concrete type, defaulting to `static_type`, and
    /// recurse into its embedded relationships.
    fn tag(&self, item: Value, static_type: &str) -> Result<Value, EngineError> {
        let mut object = match item {
            Value::Object(object) => object,
            Value::Null => return Ok(Value::Null),
            _ => return Err(EngineError::InvalidData(format!("resources of '{static_type}' must be JSON objects"))),
        };

        let concrete = match object.get(TYPE_TAG) {
            Some(Value::String(concrete)) => concrete.clone(),
            Some(_) => return Err(EngineError::InvalidData(format!("'{TYPE_TAG}' must be a resource type name"))),
            None => static_type.to_string(),
        };
        if !self.graph.is_same_or_derived(&concrete, static_type) {
            return Err(EngineError::InvalidData(format!("'{concrete}' is not a '{static_type}' resource")));
        }
        object.insert(TYPE_TAG.to_string(), Value::String(concrete.clone()));

        for declaring in self.graph.base_chain(&concrete) {
            for field in declaring.fields.values() {
                let Some(value) = object.remove(&field.name) else {
                    continue;
                };
                let tagged = match (&field.kind, value) {
                    (FieldKind::ToOne { target }, value) => self.tag(value, target)?,
                    (FieldKind::ToMany { target }, Value::Array(items)) => Value::Array(
                        items.into_iter().map(|i| self.tag(i, target)).collect::<Result<Vec<_>, _>>()?,
                    ),
                    (FieldKind::ToMany { .. }, Value::Null) => Value::Null,
                    (FieldKind::ToMany { .. }, _) => {
                        return Err(EngineError::InvalidData(format!("'{}' must hold an array", field.name)));
                    }
                    (FieldKind::Attribute { .. }, value) => value,
                };
                object.insert(field.name.clone(), tagged);
            }
        }
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        compiler::QueryCompiler,
        fixtures,
        model::{
            ComparisonOperator, FilterExpression, IncludeExpression, Literal, PaginationExpression, QueryLayer, QueryValue,
            SortExpression, TextMatchKind,
        },
    };

    fn run(layer: &QueryLayer) -> Vec<Value> {
        let graph = fixtures::blog_graph();
        let engine = fixtures::blog_engine(&graph);
        let query = QueryCompiler::new(&graph).compile(layer).unwrap();
        engine.execute(&query).unwrap()
    }

    fn field<'v>(rows: &'v [Value], name: &str) -> Vec<&'v Value> {
        rows.iter().map(|r| &r[name]).collect()
    }

    #[test]
    fn test_identity_layer_returns_every_resource_without_relationships() {
        let rows = run(&QueryLayer::new("articles"));
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.get("author").is_none() && r.get("$type").is_none()));
        assert_eq!(rows[0]["title"], json!("Rust ownership"));
    }

    #[test]
    fn test_include_keeps_requested_relationships() {
        let layer = QueryLayer::new("articles").with_include(IncludeExpression::parse("author").unwrap());
        let rows = run(&layer);
        assert_eq!(rows[1]["author"]["name"], json!("Bob"));
        assert!(rows[1]["author"].get("manager").is_none());
        assert!(rows[1].get("tags").is_none());
    }

    #[test]
    fn test_filter_sort_and_paginate() {
        let layer = QueryLayer::new("articles")
            .with_filter(FilterExpression::has("tags", None))
            .with_sort(SortExpression::parse("-createdAt"))
            .with_pagination(PaginationExpression::new(0, Some(1)))
            .select(&["title"]);
        assert_eq!(run(&layer), vec![json!({ "id": 2, "title": "Async in practice" })]);
    }

    #[test]
    fn test_take_zero_and_skip_past_end_are_empty() {
        let take_zero = QueryLayer::new("articles").with_pagination(PaginationExpression::take(0));
        assert!(run(&take_zero).is_empty());
        let past_end = QueryLayer::new("articles").with_pagination(PaginationExpression::from_page(2, None).unwrap());
        assert!(run(&past_end).is_empty());
    }

    #[test]
    fn test_nested_projection_applies_per_parent() {
        let revisions = QueryLayer::new("revisions")
            .with_filter(FilterExpression::equals("isPublished", true))
            .with_sort(SortExpression::parse("-createdAt"))
            .with_pagination(PaginationExpression::take(3))
            .select(&["title"]);
        let layer = QueryLayer::new("articles").select(&["title"]).select_nested("revisions", revisions);
        let rows = run(&layer);

        assert_eq!(
            rows[0]["revisions"],
            json!([{ "id": 14, "title": "fourth" }, { "id": 13, "title": "third" }, { "id": 12, "title": "second" }])
        );
        assert_eq!(rows[1]["revisions"], json!([{ "id": 20, "title": "only" }]));
        assert_eq!(rows[2]["revisions"], json!([]));
    }

    #[test]
    fn test_unprojected_nested_layer_keeps_only_its_includes() {
        let revisions = QueryLayer::new("revisions").with_pagination(PaginationExpression::take(1));
        let layer = QueryLayer::new("articles").select(&["title"]).select_nested("revisions", revisions);
        let rows = run(&layer);
        assert_eq!(rows[1]["revisions"], json!([{ "id": 20, "title": "only", "isPublished": true, "createdAt": "2024-04-30T08:00:00Z" }]));

        let revisions = QueryLayer::new("revisions").with_include(IncludeExpression::parse("author").unwrap());
        let layer = QueryLayer::new("articles").select(&["title"]).select_nested("revisions", revisions);
        let rows = run(&layer);
        assert_eq!(rows[1]["revisions"][0]["author"], json!({ "id": 2, "name": "Bob", "email": null }));
    }

    #[test]
    fn test_to_one_projection_is_null_for_missing_relationship() {
        let layer = QueryLayer::new("articles")
            .select(&["title"])
            .select_nested("reviewer", QueryLayer::new("people").select(&["name"]));
        let rows = run(&layer);
        assert_eq!(rows[0]["reviewer"], json!({ "id": 2, "name": "Bob" }));
        assert_eq!(rows[1]["reviewer"], Value::Null);
    }

    #[test]
    fn test_polymorphic_filter_and_projection() {
        let layer = QueryLayer::new("contentItems")
            .with_filter(FilterExpression::is_type(
                None,
                "blogs",
                Some(FilterExpression::match_text("url", TextMatchKind::EndsWith, ".dev")),
            ))
            .select(&["title", "posts"]);
        let rows = run(&layer);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("Dev blog"));
        assert_eq!(field(&rows, "posts")[0].as_array().map(Vec::len), Some(1));

        let videos = QueryLayer::new("contentItems")
            .with_filter(FilterExpression::compare(QueryValue::field("durationSeconds"), ComparisonOperator::GreaterThan, 60i64))
            .select(&["title"]);
        assert_eq!(run(&videos), vec![json!({ "id": 3, "title": "Conference talk" })]);
    }

    #[test]
    fn test_sort_by_count_then_nullable_rating() {
        let layer = QueryLayer::new("articles").with_sort(SortExpression::parse("-count(revisions),rating")).select(&["title"]);
        assert_eq!(
            field(&run(&layer), "title"),
            vec![&json!("Rust ownership"), &json!("Async in practice"), &json!("Gardening")]
        );

        let by_rating = QueryLayer::new("articles").with_sort(SortExpression::parse("rating")).select(&["title"]);
        assert_eq!(
            field(&run(&by_rating), "title"),
            vec![&json!("Gardening"), &json!("Rust ownership"), &json!("Async in practice")]
        );
    }

    #[test]
    fn test_to_many_chain_filter_matches_any() {
        let layer = QueryLayer::new("articles")
            .with_filter(FilterExpression::equals("tags.name", "memory"))
            .select(&["title"]);
        assert_eq!(run(&layer), vec![json!({ "id": 1, "title": "Rust ownership" })]);
    }

    #[test]
    fn test_datetime_literal_comparison() {
        let cutoff = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc);
        let layer = QueryLayer::new("articles")
            .with_filter(FilterExpression::compare(QueryValue::field("createdAt"), ComparisonOperator::LessThan, Literal::DateTime(cutoff)))
            .select(&["title"]);
        assert_eq!(run(&layer), vec![json!({ "id": 3, "title": "Gardening" })]);
    }

    #[test]
    fn test_insert_rejects_unrelated_type_tag() {
        let graph = fixtures::blog_graph();
        let engine = InMemoryEngine::new(&graph);
        let err = engine.insert("contentItems", json!({ "$type": "articles", "id": 1 })).unwrap_err();
        assert!(matches!(err, EngineError::InvalidData(_)));
        assert!(matches!(engine.insert("comments", json!({})), Err(EngineError::UnknownResourceType(_))));
    }

    #[test]
    fn test_load_json_counts_resources() {
        let graph = fixtures::blog_graph();
        let engine = InMemoryEngine::new(&graph);
        let count = engine.load_json(r#"{ "tags": [{ "id": 1, "name": "a" }, { "id": 2, "name": "b" }] }"#).unwrap();
        assert_eq!(count, 2);
        assert!(matches!(engine.load_json(r#"{ "tags": 3 }"#), Err(EngineError::InvalidData(_))));
        assert!(matches!(engine.load_json("nope"), Err(EngineError::Json(_))));
    }
}
