use crate::{
    compiler::{CompileContext, CompileError, FieldResolver},
    graph::ResourceType,
    model::IncludeExpression,
    plan::QueryExpr,
};

/// Translates an include tree into eager-load operators, one per leaf path.
///
/// A shared prefix (`author` in `author.manager` and `author.articles`) is
/// not emitted on its own: loading a path loads every relationship on it.
pub struct IncludeClauseBuilder<'c, 'a> {
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> IncludeClauseBuilder<'c, 'a> {
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn apply_include(
        &self,
        source: QueryExpr,
        include: &IncludeExpression,
        resource_type: &'a ResourceType,
    ) -> Result<QueryExpr, CompileError> {
        let mut paths = Vec::new();
        self.collect_paths(include, resource_type, &mut Vec::new(), &mut paths)?;
        tracing::trace!(paths = paths.len(), "include.paths");

        Ok(paths
            .into_iter()
            .fold(source, |input, path| QueryExpr::Include { input: Box::new(input), path }))
    }

    fn collect_paths(
        &self,
        include: &IncludeExpression,
        resource_type: &'a ResourceType,
        prefix: &mut Vec<String>,
        paths: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        for element in include.elements() {
            prefix.push(element.relationship.clone());
            let path = prefix.join(".");
            let _depth = self.ctx.enter(&path)?;

            let resolved = FieldResolver::resolve(self.ctx.graph, resource_type, &element.relationship, &path)?;
            if !resolved.field.is_relationship() {
                return Err(CompileError::mismatch(path, "relationship", resolved.field.describe()));
            }
            let target = self.ctx.target_of(&resolved, &path)?;

            if element.children.is_empty() {
                paths.push(path);
            } else {
                self.collect_paths(&element.children, target, prefix, paths)?;
            }
            prefix.pop();
        }
        Ok(())
    }
}
