use std::collections::VecDeque;

use crate::{
    compiler::{CompileContext, CompileError},
    graph::{FieldKind, ResourceField, ResourceType, ResourceTypeProvider},
    model::ResourceFieldChain,
    plan::ValueExpr,
};

/// A field name resolved against a resource type.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'g> {
    pub field: &'g ResourceField,
    pub declaring_type: &'g ResourceType,
    /// The field is declared on a type derived from the one it was looked up
    /// on, so accessing it needs a cast.
    pub via_derived: bool,
}

pub struct FieldResolver;

impl FieldResolver {
    /// Resolve `name` on `owner`: first along its base chain, then on its
    /// derived types (breadth first, sorted by name).
    pub fn resolve<'g>(
        graph: &'g dyn ResourceTypeProvider,
        owner: &ResourceType,
        name: &str,
        path: &str,
    ) -> Result<ResolvedField<'g>, CompileError> {
        for declaring_type in graph.base_chain(&owner.name) {
            if let Some(field) = graph.declared_field(&declaring_type.name, name) {
                return Ok(ResolvedField { field, declaring_type, via_derived: false });
            }
        }

        let mut matches: Vec<ResolvedField<'g>> = Vec::new();
        let mut queue: VecDeque<&'g ResourceType> = graph.derived_types(&owner.name).into();
        while let Some(derived) = queue.pop_front() {
            match graph.declared_field(&derived.name, name) {
                Some(field) => matches.push(ResolvedField { field, declaring_type: derived, via_derived: true }),
                None => queue.extend(graph.derived_types(&derived.name)),
            }
        }

        match matches.len() {
            0 => Err(CompileError::UnknownField { resource_type: owner.name.clone(), path: path.to_string() }),
            1 => Ok(matches[0]),
            _ => {
                let declaring: Vec<&str> = matches.iter().map(|m| m.declaring_type.name.as_str()).collect();
                Err(CompileError::unsupported(
                    path,
                    format!("field '{name}' is declared on multiple types derived from '{}': {}", owner.name, declaring.join(", ")),
                ))
            }
        }
    }

    /// Member access for `resolved` on `current`.
    pub fn access(current: ValueExpr, resolved: &ResolvedField) -> ValueExpr {
        let target = if resolved.via_derived {
            ValueExpr::As { operand: Box::new(current), element_type: resolved.declaring_type.element_type.clone() }
        } else {
            current
        };
        ValueExpr::member(target, &resolved.field.name)
    }

    /// Walk a chain whose segments before the last are all to-one
    /// relationships, returning the access expression and the resolved last
    /// segment. A to-many segment before the last is unsupported: it has no
    /// single value to continue from. Each relationship crossed counts as one
    /// nesting level.
    pub fn resolve_to_one_path<'a>(
        ctx: &CompileContext<'a>,
        chain: &ResourceFieldChain,
        current: ValueExpr,
        owner: &'a ResourceType,
    ) -> Result<(ValueExpr, ResolvedField<'a>), CompileError> {
        let Some((last, relationships)) = chain.fields.split_last() else {
            return Err(CompileError::invalid("", "field chains must not be empty"));
        };

        let mut guards = Vec::with_capacity(relationships.len());
        let mut expr = current;
        let mut ty = owner;
        for (index, name) in relationships.iter().enumerate() {
            let path = chain.prefix(index + 1);
            let resolved = Self::resolve(ctx.graph, ty, name, &path)?;
            expr = Self::access(expr, &resolved);
            match &resolved.field.kind {
                FieldKind::ToOne { .. } => {
                    guards.push(ctx.enter(&path)?);
                    ty = ctx.target_of(&resolved, &path)?;
                }
                FieldKind::ToMany { .. } => {
                    return Err(CompileError::unsupported(
                        chain.to_string(),
                        format!("'{path}' is a to-many relationship and cannot be traversed to a single value"),
                    ));
                }
                FieldKind::Attribute { .. } => {
                    return Err(CompileError::mismatch(path, "relationship", resolved.field.describe()));
                }
            }
        }

        let resolved = Self::resolve(ctx.graph, ty, last, &chain.to_string())?;
        Ok((Self::access(expr, &resolved), resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler::CompilerConfig, fixtures};

    fn param(name: &str) -> ValueExpr {
        ValueExpr::Parameter(name.to_string())
    }

    #[test]
    fn test_resolves_inherited_field_without_cast() {
        let graph = fixtures::blog_graph();
        let blogs = graph.resource_type("blogs").unwrap();
        let resolved = FieldResolver::resolve(&graph, blogs, "title", "title").unwrap();
        assert_eq!(resolved.declaring_type.name, "contentItems");
        assert!(!resolved.via_derived);
        assert_eq!(FieldResolver::access(param("blog"), &resolved).to_string(), "blog.title");
    }

    #[test]
    fn test_resolves_derived_field_with_cast() {
        let graph = fixtures::blog_graph();
        let items = graph.resource_type("contentItems").unwrap();
        let resolved = FieldResolver::resolve(&graph, items, "posts", "posts").unwrap();
        assert!(resolved.via_derived);
        assert_eq!(FieldResolver::access(param("contentItem"), &resolved).to_string(), "(contentItem as Blog).posts");
    }

    #[test]
    fn test_field_on_sibling_derived_types_is_ambiguous() {
        let graph = fixtures::blog_graph();
        let items = graph.resource_type("contentItems").unwrap();
        let err = FieldResolver::resolve(&graph, items, "url", "url").unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedQuery { ref path, .. } if path == "url"));
    }

    #[test]
    fn test_unknown_field() {
        let graph = fixtures::blog_graph();
        let articles = graph.resource_type("articles").unwrap();
        let err = FieldResolver::resolve(&graph, articles, "nope", "author.nope").unwrap_err();
        assert_eq!(err, CompileError::UnknownField { resource_type: "articles".into(), path: "author.nope".into() });
    }

    #[test]
    fn test_to_one_path() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new();
        let ctx = CompileContext::new(&graph, &config);
        let articles = graph.resource_type("articles").unwrap();
        let chain = ResourceFieldChain::from("author.manager.name");
        let (expr, resolved) = FieldResolver::resolve_to_one_path(&ctx, &chain, param("article"), articles).unwrap();
        assert_eq!(expr.to_string(), "article.author.manager.name");
        assert_eq!(resolved.field.name, "name");
    }

    #[test]
    fn test_to_one_path_rejects_to_many_segment() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new();
        let ctx = CompileContext::new(&graph, &config);
        let people = graph.resource_type("people").unwrap();
        let chain = ResourceFieldChain::from("articles.title");
        let err = FieldResolver::resolve_to_one_path(&ctx, &chain, param("person"), people).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedQuery { ref path, .. } if path == "articles.title"));
    }

    #[test]
    fn test_to_one_path_counts_each_relationship() {
        let graph = fixtures::blog_graph();
        let config = CompilerConfig::new().with_max_depth(2);
        let ctx = CompileContext::new(&graph, &config);
        let articles = graph.resource_type("articles").unwrap();

        let chain = ResourceFieldChain::from("author.manager.name");
        assert!(FieldResolver::resolve_to_one_path(&ctx, &chain, param("article"), articles).is_ok());
        assert_eq!(ctx.depth(), 0);

        let chain = ResourceFieldChain::from("author.manager.manager.name");
        let err = FieldResolver::resolve_to_one_path(&ctx, &chain, param("article"), articles).unwrap_err();
        assert_eq!(err, CompileError::MaxDepthExceeded { path: "author.manager.manager".into(), max_depth: 2 });
        assert_eq!(ctx.depth(), 0);
    }
}
