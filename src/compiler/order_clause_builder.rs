use crate::{
    compiler::{CompileContext, CompileError, FieldResolver, LambdaScope, ResolvedField},
    graph::{FieldKind, ResourceType},
    model::{ResourceFieldChain, SortElementExpression, SortExpression, SortTarget},
    plan::{QueryExpr, SortDirection, ValueExpr},
};

/// Translates sort keys into a primary order followed by tie-breakers, all
/// over the same range variable.
pub struct OrderClauseBuilder<'c, 'a> {
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> OrderClauseBuilder<'c, 'a> {
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn apply_order_by(
        &self,
        source: QueryExpr,
        sort: &SortExpression,
        scope: &LambdaScope<'_>,
        resource_type: &'a ResourceType,
    ) -> Result<QueryExpr, CompileError> {
        if sort.elements.is_empty() {
            return Err(CompileError::invalid("sort", "a sort expression requires at least one element"));
        }

        let mut expr = source;
        for (index, element) in sort.elements.iter().enumerate() {
            let key = self.key(element, scope.accessor(), resource_type)?;
            expr = QueryExpr::OrderBy {
                input: Box::new(expr),
                key: scope.lambda(key),
                direction: if element.ascending { SortDirection::Ascending } else { SortDirection::Descending },
                then_by: index > 0,
            };
        }
        Ok(expr)
    }

    fn key(
        &self,
        element: &SortElementExpression,
        current: ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<ValueExpr, CompileError> {
        match &element.target {
            SortTarget::Field(chain) => {
                let (member, resolved) = self.resolve(chain, current, resource_type)?;
                match &resolved.field.kind {
                    FieldKind::Attribute { .. } => Ok(member),
                    FieldKind::ToMany { .. } => Err(CompileError::unsupported(
                        chain.to_string(),
                        "sorting on a to-many relationship is undefined; sort on count() instead",
                    )),
                    FieldKind::ToOne { .. } => {
                        Err(CompileError::mismatch(chain.to_string(), "attribute", resolved.field.describe()))
                    }
                }
            }
            SortTarget::Count(chain) => {
                let (member, resolved) = self.resolve(chain, current, resource_type)?;
                if !resolved.field.is_to_many() {
                    return Err(CompileError::mismatch(chain.to_string(), "to-many relationship", resolved.field.describe()));
                }
                Ok(ValueExpr::Count { source: Box::new(member) })
            }
        }
    }

    fn resolve(
        &self,
        chain: &ResourceFieldChain,
        current: ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<(ValueExpr, ResolvedField<'a>), CompileError> {
        FieldResolver::resolve_to_one_path(self.ctx, chain, current, resource_type).map_err(|err| match err {
            CompileError::UnsupportedQuery { path, .. } => {
                CompileError::unsupported(path, "sorting across a to-many relationship is undefined")
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler::CompilerConfig, fixtures, graph::ResourceTypeProvider};

    fn compile(sort: &SortExpression) -> Result<String, CompileError> {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new();
        let ctx = CompileContext::new(&graph, &config);
        let articles = graph.resource_type("articles").unwrap();
        let scope = ctx.create_scope(&articles.element_type);
        let expr = OrderClauseBuilder::new(&ctx).apply_order_by(QueryExpr::source("articles", "Article"), sort, &scope, articles)?;
        Ok(expr.to_string())
    }

    #[test]
    fn test_primary_then_tie_breakers() {
        let sort = SortExpression::parse("-createdAt,author.name,-count(tags)");
        assert_eq!(
            compile(&sort).unwrap(),
            "Source<Article>.OrderByDescending(article => article.createdAt).ThenBy(article => article.author.name).ThenByDescending(article => article.tags.Count())"
        );
    }

    #[test]
    fn test_to_many_key_is_unsupported() {
        let err = compile(&SortExpression::parse("tags.name")).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedQuery { ref path, .. } if path == "tags.name"));

        let err = compile(&SortExpression::parse("tags")).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedQuery { ref path, .. } if path == "tags"));
    }

    #[test]
    fn test_to_one_terminal_is_type_mismatch() {
        let err = compile(&SortExpression::parse("author")).unwrap_err();
        assert_eq!(err, CompileError::mismatch("author", "attribute", "to-one relationship to 'people'"));
    }

    #[test]
    fn test_count_of_to_one_is_type_mismatch() {
        let err = compile(&SortExpression::parse("count(author)")).unwrap_err();
        assert!(matches!(err, CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn test_long_to_one_key_is_bounded() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new().with_max_depth(4);
        let ctx = CompileContext::new(&graph, &config);
        let articles = graph.resource_type("articles").unwrap();
        let scope = ctx.create_scope(&articles.element_type);

        let sort = SortExpression::parse(&format!("author{}.name", ".manager".repeat(40)));
        let err = OrderClauseBuilder::new(&ctx)
            .apply_order_by(QueryExpr::source("articles", "Article"), &sort, &scope, articles)
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::MaxDepthExceeded { path: "author.manager.manager.manager.manager".into(), max_depth: 4 }
        );
    }

    #[test]
    fn test_empty_sort_is_invalid() {
        assert!(matches!(compile(&SortExpression::new(vec![])), Err(CompileError::InvalidArgument { .. })));
    }
}
