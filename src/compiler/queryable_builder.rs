use crate::{
    compiler::{
        CompileContext, CompileError, CompilerConfig, IncludeClauseBuilder, OrderClauseBuilder, SelectClauseBuilder,
        SkipTakeClauseBuilder, WhereClauseBuilder,
    },
    graph::{ResourceType, ResourceTypeProvider},
    model::QueryLayer,
    plan::QueryExpr,
};

/// Applies the clauses of one query layer to a source, in the fixed order
/// include, filter, sort, pagination, projection. Absent clauses are skipped.
pub struct QueryableBuilder<'c, 'a> {
    source: QueryExpr,
    resource_type: &'a ResourceType,
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> QueryableBuilder<'c, 'a> {
    pub fn new(source: QueryExpr, resource_type: &'a ResourceType, ctx: &'c CompileContext<'a>) -> Self {
        Self { source, resource_type, ctx }
    }

    pub fn apply_query(&self, layer: &QueryLayer) -> Result<QueryExpr, CompileError> {
        let resource_type = self.resource_type;
        if layer.resource_type != resource_type.name {
            return Err(CompileError::mismatch(
                layer.resource_type.clone(),
                resource_type.name.clone(),
                layer.resource_type.clone(),
            ));
        }

        let mut expr = self.source.clone();

        if let Some(include) = &layer.include {
            tracing::trace!(resource = %resource_type.name, include = %include, "query.include");
            expr = IncludeClauseBuilder::new(self.ctx).apply_include(expr, include, resource_type)?;
        }

        if let Some(filter) = &layer.filter {
            tracing::trace!(resource = %resource_type.name, filter = %filter, "query.filter");
            let scope = self.ctx.create_scope(&resource_type.element_type);
            expr = WhereClauseBuilder::new(self.ctx).apply_where(expr, filter, &scope, resource_type)?;
        }

        if let Some(sort) = &layer.sort {
            tracing::trace!(resource = %resource_type.name, sort = %sort, "query.sort");
            let scope = self.ctx.create_scope(&resource_type.element_type);
            expr = OrderClauseBuilder::new(self.ctx).apply_order_by(expr, sort, &scope, resource_type)?;
        }

        if let Some(pagination) = &layer.pagination {
            tracing::trace!(resource = %resource_type.name, pagination = %pagination, "query.pagination");
            expr = SkipTakeClauseBuilder::apply_skip_take(expr, pagination);
        }

        if let Some(projection) = layer.effective_projection() {
            tracing::trace!(resource = %resource_type.name, fields = projection.len(), "query.projection");
            let scope = self.ctx.create_scope(&resource_type.element_type);
            expr = SelectClauseBuilder::new(self.ctx).apply_select(expr, projection, &scope, resource_type)?;
        }

        Ok(expr)
    }
}

/// Compiles query layers against a resource graph.
///
/// Holds no per-query state: each `compile` call gets its own range-variable
/// factory and depth counter, so one compiler can serve any number of
/// queries, and equal layers always compile to equal expressions.
pub struct QueryCompiler<'a> {
    graph: &'a dyn ResourceTypeProvider,
    config: CompilerConfig,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(graph: &'a dyn ResourceTypeProvider) -> Self {
        Self::with_config(graph, CompilerConfig::default())
    }

    pub fn with_config(graph: &'a dyn ResourceTypeProvider, config: CompilerConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(&self, layer: &QueryLayer) -> Result<QueryExpr, CompileError> {
        let ctx = CompileContext::new(self.graph, &self.config);
        let resource_type = ctx.resource_type(&layer.resource_type)?;
        tracing::debug!(resource = %resource_type.name, layer = %layer, "query.compile");

        let source = QueryExpr::source(&resource_type.name, &resource_type.element_type);
        let result = QueryableBuilder::new(source, resource_type, &ctx).apply_query(layer);

        match &result {
            Ok(expr) => tracing::debug!(
                resource = %resource_type.name,
                scopes = ctx.scopes.issued_count(),
                expression = %expr,
                "query.compiled"
            ),
            Err(error) => tracing::debug!(resource = %resource_type.name, error = %error, "query.compile_failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures,
        model::{
            ComparisonOperator, FilterExpression, IncludeExpression, Literal, PaginationExpression, QueryValue,
            SortExpression, TextMatchKind,
        },
    };

    #[test]
    fn test_empty_layer_is_identity() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        assert_eq!(compiler.compile(&QueryLayer::new("articles")).unwrap(), QueryExpr::source("articles", "Article"));
    }

    #[test]
    fn test_unknown_resource_type() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        assert_eq!(
            compiler.compile(&QueryLayer::new("comments")).unwrap_err(),
            CompileError::UnknownResourceType("comments".into())
        );
    }

    #[test]
    fn test_clause_order_and_scope_names() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        let layer = QueryLayer::new("articles")
            .with_include(IncludeExpression::parse("author").unwrap())
            .with_filter(FilterExpression::match_text("title", TextMatchKind::Contains, "rust"))
            .with_sort(SortExpression::parse("-createdAt"))
            .with_pagination(PaginationExpression::new(10, Some(5)))
            .select(&["title"]);
        assert_eq!(
            compiler.compile(&layer).unwrap().to_string(),
            "Source<Article>.Include(\"author\").Where(article => article.title.Contains(\"rust\")).OrderByDescending(article2 => article2.createdAt).Skip(10).Take(5).Select(article3 => new Article { id = article3.id, title = article3.title })"
        );
    }

    #[test]
    fn test_nested_projection_with_own_filter_sort_and_pagination() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        let revisions = QueryLayer::new("revisions")
            .with_filter(FilterExpression::equals("isPublished", true))
            .with_sort(SortExpression::parse("-createdAt"))
            .with_pagination(PaginationExpression::take(3))
            .select(&["title"]);
        let layer = QueryLayer::new("articles").select(&["title"]).select_nested("revisions", revisions);
        assert_eq!(
            compiler.compile(&layer).unwrap().to_string(),
            "Source<Article>.Select(article => new Article { id = article.id, revisions = article.revisions.Where(revision => (revision.isPublished == true)).OrderByDescending(revision2 => revision2.createdAt).Take(3).Select(revision3 => new Revision { id = revision3.id, title = revision3.title }).ToList(), title = article.title })"
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        let layer = QueryLayer::new("articles")
            .with_filter(FilterExpression::or(vec![
                FilterExpression::has("tags", Some(FilterExpression::equals("name", "rust"))),
                FilterExpression::compare(QueryValue::count("revisions"), ComparisonOperator::GreaterThan, 2i64),
            ]))
            .select(&["title", "caption"]);
        let reordered = QueryLayer::new("articles")
            .with_filter(layer.filter.clone().unwrap())
            .select(&["caption", "title"]);

        let first = compiler.compile(&layer).unwrap();
        assert_eq!(first, compiler.compile(&layer).unwrap());
        assert_eq!(first, compiler.compile(&reordered).unwrap());
    }

    #[test]
    fn test_errors_do_not_leak_into_later_compiles() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::new(&graph);
        let bad = QueryLayer::new("articles").with_filter(FilterExpression::equals("wordCount", "x"));
        assert!(compiler.compile(&bad).is_err());

        let good = QueryLayer::new("articles").with_filter(FilterExpression::equals("caption", Literal::Null));
        assert_eq!(
            compiler.compile(&good).unwrap().to_string(),
            "Source<Article>.Where(article => (article.caption == null))"
        );
    }

    #[test]
    fn test_concurrent_compiles_share_graph() {
        let graph = fixtures::blog_graph();
        let layer = QueryLayer::new("articles")
            .with_filter(FilterExpression::has("tags", None))
            .with_sort(SortExpression::parse("title"));
        let expected = QueryCompiler::new(&graph).compile(&layer).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| QueryCompiler::new(&graph).compile(&layer).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_max_depth_from_config() {
        let graph = fixtures::blog_graph();
        let compiler = QueryCompiler::with_config(&graph, CompilerConfig::new().with_max_depth(1));
        let layer = QueryLayer::new("articles").with_include(IncludeExpression::parse("author.manager").unwrap());
        assert_eq!(
            compiler.compile(&layer).unwrap_err(),
            CompileError::MaxDepthExceeded { path: "author.manager".into(), max_depth: 1 }
        );
    }
}
