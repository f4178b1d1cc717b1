pub mod graph;
pub use graph::{ResourceGraph, ResourceType, ResourceTypeProvider, ValueType};

pub mod model;
pub use model::{FilterExpression, IncludeExpression, PaginationExpression, QueryLayer, SortExpression};

pub mod plan;
pub use plan::{QueryExpr, ValueExpr};

pub mod compiler;
pub use compiler::{CompileError, CompilerConfig, QueryCompiler};

pub mod engine;
pub use engine::{EngineError, InMemoryEngine};

#[cfg(test)]
mod fixtures;
