use std::fmt::{self, Display};

use crate::plan::{Lambda, ValueExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A composable query over a sequence of elements, built up one operator at
/// a time. The innermost node is always the sequence the query starts from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryExpr {
    /// All resources of a type, as held by the execution engine.
    Source { resource_type: String, element_type: String },
    /// The elements of a to-many relationship of an enclosing element.
    Navigation { source: ValueExpr, element_type: String },
    /// Eager-load the relationship path (dotted) for the response.
    Include { input: Box<QueryExpr>, path: String },
    Where { input: Box<QueryExpr>, predicate: Lambda },
    /// Primary order when `then_by` is false, tie-breaker otherwise.
    OrderBy { input: Box<QueryExpr>, key: Lambda, direction: SortDirection, then_by: bool },
    Skip { input: Box<QueryExpr>, count: u64 },
    Take { input: Box<QueryExpr>, count: u64 },
    Select { input: Box<QueryExpr>, selector: Lambda },
}

impl QueryExpr {
    pub fn source(resource_type: &str, element_type: &str) -> Self {
        QueryExpr::Source { resource_type: resource_type.to_string(), element_type: element_type.to_string() }
    }

    pub fn input(&self) -> Option<&QueryExpr> {
        match self {
            QueryExpr::Source { .. } | QueryExpr::Navigation { .. } => None,
            QueryExpr::Include { input, .. }
            | QueryExpr::Where { input, .. }
            | QueryExpr::OrderBy { input, .. }
            | QueryExpr::Skip { input, .. }
            | QueryExpr::Take { input, .. }
            | QueryExpr::Select { input, .. } => Some(input),
        }
    }

    /// The innermost node of the operator chain.
    pub fn root(&self) -> &QueryExpr {
        let mut current = self;
        while let Some(input) = current.input() {
            current = input;
        }
        current
    }

    /// Include paths of this chain, innermost first.
    pub fn include_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        let mut current = Some(self);
        while let Some(expr) = current {
            if let QueryExpr::Include { path, .. } = expr {
                paths.push(path.as_str());
            }
            current = expr.input();
        }
        paths.reverse();
        paths
    }
}

impl Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpr::Source { element_type, .. } => write!(f, "Source<{element_type}>"),
            QueryExpr::Navigation { source, .. } => write!(f, "{source}"),
            QueryExpr::Include { input, path } => write!(f, "{input}.Include({path:?})"),
            QueryExpr::Where { input, predicate } => write!(f, "{input}.Where({predicate})"),
            QueryExpr::OrderBy { input, key, direction, then_by } => {
                let method = match (then_by, direction) {
                    (false, SortDirection::Ascending) => "OrderBy",
                    (false, SortDirection::Descending) => "OrderByDescending",
                    (true, SortDirection::Ascending) => "ThenBy",
                    (true, SortDirection::Descending) => "ThenByDescending",
                };
                write!(f, "{input}.{method}({key})")
            }
            QueryExpr::Skip { input, count } => write!(f, "{input}.Skip({count})"),
            QueryExpr::Take { input, count } => write!(f, "{input}.Take({count})"),
            QueryExpr::Select { input, selector } => write!(f, "{input}.Select({selector})"),
        }
    }
}
