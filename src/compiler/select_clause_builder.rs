use crate::{
    compiler::{CompileContext, CompileError, FieldResolver, LambdaScope, QueryableBuilder, ResolvedField},
    graph::{FieldKind, ResourceType},
    model::{Projection, QueryLayer},
    plan::{CompareOp, QueryExpr, ValueExpr},
};

/// Translates a projection into an object construction per element.
///
/// Bindings are ordered identity first, then by field name, so equal
/// projections produce equal output regardless of how they were built.
pub struct SelectClauseBuilder<'c, 'a> {
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> SelectClauseBuilder<'c, 'a> {
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn apply_select(
        &self,
        source: QueryExpr,
        projection: &Projection,
        scope: &LambdaScope<'_>,
        resource_type: &'a ResourceType,
    ) -> Result<QueryExpr, CompileError> {
        let body = self.create_body(scope.accessor(), projection, resource_type)?;
        Ok(QueryExpr::Select { input: Box::new(source), selector: scope.lambda(body) })
    }

    fn create_body(
        &self,
        accessor: ValueExpr,
        projection: &Projection,
        resource_type: &'a ResourceType,
    ) -> Result<ValueExpr, CompileError> {
        let mut entries: Vec<(ResolvedField<'a>, Option<&QueryLayer>)> = Vec::with_capacity(projection.len() + 1);
        for (name, layer) in projection {
            let resolved = FieldResolver::resolve(self.ctx.graph, resource_type, name, name)?;
            entries.push((resolved, layer.as_ref()));
        }
        if self.ctx.config.always_include_identity && !projection.contains_key(&resource_type.id_field) {
            let resolved = FieldResolver::resolve(self.ctx.graph, resource_type, &resource_type.id_field, &resource_type.id_field)?;
            entries.push((resolved, None));
        }

        let id_field = resource_type.id_field.as_str();
        entries.sort_by(|(a, _), (b, _)| {
            (a.field.name != id_field, a.field.name.as_str()).cmp(&(b.field.name != id_field, b.field.name.as_str()))
        });

        let mut bindings = Vec::with_capacity(entries.len());
        for (resolved, layer) in entries {
            let value = self.bind(accessor.clone(), &resolved, layer)?;
            bindings.push((resolved.field.name.clone(), value));
        }
        Ok(ValueExpr::MemberInit { element_type: resource_type.element_type.clone(), bindings })
    }

    fn bind(
        &self,
        accessor: ValueExpr,
        resolved: &ResolvedField<'a>,
        layer: Option<&QueryLayer>,
    ) -> Result<ValueExpr, CompileError> {
        let path = resolved.field.name.as_str();
        let member = FieldResolver::access(accessor, resolved);
        let Some(layer) = layer else {
            return Ok(member);
        };

        match &resolved.field.kind {
            FieldKind::Attribute { .. } => Err(CompileError::invalid(path, "an attribute cannot carry a nested query layer")),
            FieldKind::ToOne { .. } => {
                let target = self.nested_target(resolved, layer, path)?;
                if layer.include.is_some() || layer.filter.is_some() || layer.sort.is_some() || layer.pagination.is_some() {
                    return Err(CompileError::unsupported(
                        path,
                        "only a projection can be applied within a to-one relationship",
                    ));
                }
                let Some(projection) = layer.effective_projection() else {
                    return Ok(member);
                };
                let _depth = self.ctx.enter(path)?;
                let body = self.create_body(member.clone(), projection, target).map_err(|e| e.within(path))?;
                Ok(ValueExpr::Conditional {
                    test: Box::new(ValueExpr::compare(member, CompareOp::Eq, ValueExpr::null())),
                    if_true: Box::new(ValueExpr::null()),
                    if_false: Box::new(body),
                })
            }
            FieldKind::ToMany { .. } => {
                let target = self.nested_target(resolved, layer, path)?;
                let _depth = self.ctx.enter(path)?;
                let source = QueryExpr::Navigation { source: member, element_type: target.element_type.clone() };
                let query = QueryableBuilder::new(source, target, self.ctx).apply_query(layer).map_err(|e| e.within(path))?;
                Ok(ValueExpr::Subquery(Box::new(query)))
            }
        }
    }

    fn nested_target(
        &self,
        resolved: &ResolvedField<'a>,
        layer: &QueryLayer,
        path: &str,
    ) -> Result<&'a ResourceType, CompileError> {
        let target = self.ctx.target_of(resolved, path)?;
        if layer.resource_type != target.name {
            return Err(CompileError::mismatch(path, target.name.clone(), layer.resource_type.clone()));
        }
        Ok(target)
    }
}
