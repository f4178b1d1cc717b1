use serde_json::{Map, Value};

use crate::{
    engine::{EngineError, TYPE_TAG},
    graph::{ResourceField, ResourceTypeProvider},
    model::{IncludeChainConverter, IncludeExpression, ResourceFieldChain},
    plan::QueryExpr,
};

/// Shapes engine rows into response resources.
///
/// Rows of an unprojected query keep their attributes and only the
/// relationships named by the query's include paths. Type tags are removed
/// everywhere.
pub struct Materializer<'e> {
    graph: &'e dyn ResourceTypeProvider,
}

impl<'e> Materializer<'e> {
    pub fn new(graph: &'e dyn ResourceTypeProvider) -> Self {
        Self { graph }
    }

    /// Shape the rows produced by `query`: projected rows are only untagged,
    /// unprojected rows keep just the relationships named by its include
    /// paths. Applies equally to top-level queries and to sub-queries over a
    /// navigation.
    pub fn rows(&self, rows: Vec<Value>, query: &QueryExpr) -> Result<Vec<Value>, EngineError> {
        let resource_type = match (query, query.root()) {
            (QueryExpr::Select { .. }, _) => return Ok(self.projected(rows)),
            (_, QueryExpr::Source { resource_type, .. }) => resource_type.as_str(),
            (_, QueryExpr::Navigation { element_type, .. }) => self
                .graph
                .resource_type_for_element(element_type)
                .map(|t| t.name.as_str())
                .ok_or_else(|| EngineError::UnknownElementType(element_type.clone()))?,
            _ => return Ok(self.projected(rows)),
        };
        self.resources(rows, resource_type, &query.include_paths())
    }

    pub fn resources(&self, rows: Vec<Value>, resource_type: &str, include_paths: &[&str]) -> Result<Vec<Value>, EngineError> {
        let chains: Vec<ResourceFieldChain> = include_paths.iter().map(|p| ResourceFieldChain::from(*p)).collect();
        let include = IncludeChainConverter::from_chains(&chains).map_err(|e| EngineError::InvalidData(e.to_string()))?;
        Ok(rows.into_iter().map(|row| self.shape(row, resource_type, &include)).collect())
    }

    /// Projected rows only lose their type tags.
    pub fn projected(&self, rows: Vec<Value>) -> Vec<Value> {
        rows.into_iter().map(Self::untag).collect()
    }

    fn shape(&self, value: Value, static_type: &str, include: &IncludeExpression) -> Value {
        let Value::Object(object) = value else {
            return value;
        };
        let concrete = object.get(TYPE_TAG).and_then(Value::as_str).unwrap_or(static_type).to_string();

        let mut out = Map::new();
        for (name, value) in object {
            if name == TYPE_TAG {
                continue;
            }
            match self.field(&concrete, &name).and_then(|f| f.relationship_target().map(str::to_string)) {
                None => {
                    out.insert(name, value);
                }
                Some(target) => {
                    if let Some(children) = include.child(&name) {
                        let shaped = match value {
                            Value::Array(items) => Value::Array(items.into_iter().map(|i| self.shape(i, &target, children)).collect()),
                            other => self.shape(other, &target, children),
                        };
                        out.insert(name, shaped);
                    }
                }
            }
        }
        Value::Object(out)
    }

    fn field(&self, resource_type: &str, name: &str) -> Option<&'e ResourceField> {
        let graph: &'e dyn ResourceTypeProvider = self.graph;
        graph
            .base_chain(resource_type)
            .into_iter()
            .find_map(|declaring| graph.declared_field(&declaring.name, name))
    }

    fn untag(value: Value) -> Value {
        match value {
            Value::Object(object) => Value::Object(
                object
                    .into_iter()
                    .filter(|(name, _)| name != TYPE_TAG)
                    .map(|(name, value)| (name, Self::untag(value)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.into_iter().map(Self::untag).collect()),
            other => other,
        }
    }
}
