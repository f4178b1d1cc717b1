use std::cmp::Ordering;
use std::collections::VecDeque;

use serde_json::Value;

use crate::{
    engine::{EngineError, Env, Evaluator, Helpers, MemoryStore},
    graph::ResourceTypeProvider,
    plan::{Lambda, QueryExpr, SortDirection},
};

/// Runs a compiled query against a memory store, producing JSON rows.
#[derive(Clone, Copy)]
pub struct PlanExecutor<'e> {
    graph: &'e dyn ResourceTypeProvider,
    store: &'e MemoryStore,
}

impl<'e> PlanExecutor<'e> {
    pub fn new(graph: &'e dyn ResourceTypeProvider, store: &'e MemoryStore) -> Self {
        Self { graph, store }
    }

    pub fn run(&self, query: &QueryExpr) -> Result<Vec<Value>, EngineError> {
        let mut env = Env::new();
        self.run_in(query, &mut env)
    }

    /// Run `query` with the range variables of enclosing queries in scope.
    pub fn run_in(&self, query: &QueryExpr, env: &mut Env) -> Result<Vec<Value>, EngineError> {
        let eval = Evaluator::new(self.graph, self.store);
        match query {
            QueryExpr::Source { resource_type, .. } => self.scan(resource_type),
            QueryExpr::Navigation { source, .. } => eval.sequence(source, env),
            // relationships are stored embedded, so they are already loaded
            QueryExpr::Include { input, .. } => self.run_in(input, env),
            QueryExpr::Where { input, predicate } => {
                let rows = self.run_in(input, env)?;
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    if eval.test(predicate, row.clone(), env)? {
                        out.push(row);
                    }
                }
                Ok(out)
            }
            QueryExpr::OrderBy { .. } => {
                let (input, keys) = Self::sort_keys(query);
                let rows = self.run_in(input, env)?;
                self.sort(rows, &keys, env)
            }
            QueryExpr::Skip { input, count } => {
                let rows = self.run_in(input, env)?;
                Ok(rows.into_iter().skip(Self::to_usize(*count)).collect())
            }
            QueryExpr::Take { input, count } => {
                let rows = self.run_in(input, env)?;
                Ok(rows.into_iter().take(Self::to_usize(*count)).collect())
            }
            QueryExpr::Select { input, selector } => {
                let rows = self.run_in(input, env)?;
                rows.into_iter().map(|row| eval.apply(selector, row, env)).collect()
            }
        }
    }

    /// Resources of `resource_type` followed by those of its derived types,
    /// breadth first.
    fn scan(&self, resource_type: &str) -> Result<Vec<Value>, EngineError> {
        if self.graph.resource_type(resource_type).is_none() {
            return Err(EngineError::UnknownResourceType(resource_type.to_string()));
        }
        let mut rows = Vec::new();
        let mut queue = VecDeque::from([resource_type.to_string()]);
        while let Some(name) = queue.pop_front() {
            rows.extend(self.store.items(&name)?);
            queue.extend(self.graph.derived_types(&name).into_iter().map(|t| t.name.clone()));
        }
        tracing::trace!(resource_type, rows = rows.len(), "engine.scan");
        Ok(rows)
    }

    /// Split an order chain into its input and keys, primary key first.
    fn sort_keys(query: &QueryExpr) -> (&QueryExpr, Vec<(&Lambda, bool)>) {
        let mut keys = Vec::new();
        let mut current = query;
        while let QueryExpr::OrderBy { input, key, direction, then_by } = current {
            keys.push((key, *direction == SortDirection::Ascending));
            current = input.as_ref();
            if !*then_by {
                break;
            }
        }
        keys.reverse();
        (current, keys)
    }

    fn sort(&self, rows: Vec<Value>, keys: &[(&Lambda, bool)], env: &mut Env) -> Result<Vec<Value>, EngineError> {
        let eval = Evaluator::new(self.graph, self.store);
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            let values = keys
                .iter()
                .map(|(key, _)| eval.apply(key, row.clone(), env))
                .collect::<Result<Vec<_>, _>>()?;
            keyed.push((values, row));
        }

        // stable
        keyed.sort_by(|(a, _), (b, _)| {
            for (index, (_, ascending)) in keys.iter().enumerate() {
                let ord = Helpers::cmp_json_for_sort(&a[index], &b[index], *ascending);
                if !ord.is_eq() {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn to_usize(count: u64) -> usize {
        usize::try_from(count).unwrap_or(usize::MAX)
    }
}
