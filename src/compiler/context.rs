use std::cell::Cell;

use crate::{
    compiler::{CompileError, CompilerConfig, LambdaScope, LambdaScopeFactory, ResolvedField},
    graph::{ResourceType, ResourceTypeProvider},
};

/// State owned by a single compile call: the graph being compiled against,
/// the range-variable factory and the current nesting depth.
pub struct CompileContext<'a> {
    pub graph: &'a dyn ResourceTypeProvider,
    pub config: &'a CompilerConfig,
    pub scopes: LambdaScopeFactory,
    depth: Cell<usize>,
}

impl<'a> CompileContext<'a> {
    pub fn new(graph: &'a dyn ResourceTypeProvider, config: &'a CompilerConfig) -> Self {
        Self { graph, config, scopes: LambdaScopeFactory::new(), depth: Cell::new(0) }
    }

    pub fn resource_type(&self, name: &str) -> Result<&'a ResourceType, CompileError> {
        let graph: &'a dyn ResourceTypeProvider = self.graph;
        graph.resource_type(name).ok_or_else(|| CompileError::UnknownResourceType(name.to_string()))
    }

    /// Resource type on the other side of a resolved relationship.
    pub fn target_of(&self, resolved: &ResolvedField<'a>, path: &str) -> Result<&'a ResourceType, CompileError> {
        match resolved.field.relationship_target() {
            Some(target) => self.resource_type(target),
            None => Err(CompileError::mismatch(path, "relationship", resolved.field.describe())),
        }
    }

    pub fn create_scope(&self, element_type: &str) -> LambdaScope<'_> {
        self.scopes.create_scope(element_type)
    }

    /// Descend one nesting level; fails once `max_depth` would be exceeded.
    pub fn enter(&self, path: &str) -> Result<DepthGuard<'_>, CompileError> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_depth {
            return Err(CompileError::MaxDepthExceeded { path: path.to_string(), max_depth: self.config.max_depth });
        }
        self.depth.set(depth);
        tracing::trace!(path, depth, "compile.enter");
        Ok(DepthGuard { depth: &self.depth })
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

pub struct DepthGuard<'c> {
    depth: &'c Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_depth_guard_restores_on_drop() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new().with_max_depth(2);
        let ctx = CompileContext::new(&graph, &config);
        {
            let _a = ctx.enter("a").unwrap();
            let _b = ctx.enter("a.b").unwrap();
            assert_eq!(ctx.depth(), 2);
            let err = ctx.enter("a.b.c").err().unwrap();
            assert_eq!(err, CompileError::MaxDepthExceeded { path: "a.b.c".into(), max_depth: 2 });
        }
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_unknown_resource_type() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new();
        let ctx = CompileContext::new(&graph, &config);
        assert_eq!(ctx.resource_type("nope").unwrap_err(), CompileError::UnknownResourceType("nope".into()));
    }
}
