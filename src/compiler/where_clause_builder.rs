use crate::{
    compiler::{CompileContext, CompileError, FieldResolver, LambdaScope, ResolvedField},
    graph::{FieldKind, ResourceType, ValueType},
    model::{ComparisonOperator, FilterExpression, Literal, LogicalOperator, QueryValue, ResourceFieldChain},
    plan::{CompareOp, QueryExpr, ValueExpr},
};

type LeafFn<'x, 'a> = dyn Fn(ValueExpr, &ResolvedField<'a>, &str) -> Result<ValueExpr, CompileError> + 'x;

/// Translates a filter tree into a predicate over the layer's element.
///
/// To-one segments of a field chain become member accesses. A to-many
/// segment before the end of a chain lifts the rest of the chain into an
/// existential test over that relationship, so `tags.name` matches when any
/// tag matches.
pub struct WhereClauseBuilder<'c, 'a> {
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> WhereClauseBuilder<'c, 'a> {
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn apply_where(
        &self,
        source: QueryExpr,
        filter: &FilterExpression,
        scope: &LambdaScope<'_>,
        resource_type: &'a ResourceType,
    ) -> Result<QueryExpr, CompileError> {
        let body = self.visit(filter, &scope.accessor(), resource_type)?;
        Ok(QueryExpr::Where { input: Box::new(source), predicate: scope.lambda(body) })
    }

    fn visit(
        &self,
        filter: &FilterExpression,
        current: &ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<ValueExpr, CompileError> {
        let _depth = self.ctx.enter(&Self::label(filter))?;

        match filter {
            FilterExpression::Comparison { left, operator, right } => {
                self.visit_comparison(left, *operator, right, current, resource_type)
            }
            FilterExpression::Logical { operator, terms } => {
                if terms.len() < 2 {
                    return Err(CompileError::invalid(
                        Self::label(filter),
                        format!("a logical expression requires at least two terms, found {}", terms.len()),
                    ));
                }
                let terms = terms
                    .iter()
                    .map(|term| self.visit(term, current, resource_type))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match operator {
                    LogicalOperator::And => ValueExpr::And(terms),
                    LogicalOperator::Or => ValueExpr::Or(terms),
                })
            }
            FilterExpression::Not(inner) => Ok(ValueExpr::Not(Box::new(self.visit(inner, current, resource_type)?))),
            FilterExpression::MatchText { target, kind, value } => self.walk(target, current, resource_type, &|member, resolved, path| {
                match &resolved.field.kind {
                    FieldKind::Attribute { value_type: ValueType::String, .. } => {
                        Ok(ValueExpr::TextMatch { operand: Box::new(member), kind: *kind, value: value.clone() })
                    }
                    _ => Err(CompileError::mismatch(path, "string attribute", resolved.field.describe())),
                }
            }),
            FilterExpression::AnyOf { target, constants } => self.walk(target, current, resource_type, &|member, resolved, path| {
                if constants.is_empty() {
                    return Err(CompileError::invalid(path, "any() requires at least one constant"));
                }
                for constant in constants {
                    Self::check_against_constant(resolved, path, ComparisonOperator::Equals, constant)?;
                }
                if !matches!(resolved.field.kind, FieldKind::Attribute { .. }) {
                    return Err(CompileError::mismatch(path, "attribute", resolved.field.describe()));
                }
                Ok(ValueExpr::InSet { operand: Box::new(member), values: constants.iter().cloned().collect() })
            }),
            FilterExpression::Has { target, filter } => self.walk(target, current, resource_type, &|member, resolved, path| {
                if !resolved.field.is_to_many() {
                    return Err(CompileError::mismatch(path, "to-many relationship", resolved.field.describe()));
                }
                let predicate = match filter {
                    None => None,
                    Some(filter) => {
                        let target = self.ctx.target_of(resolved, path)?;
                        let scope = self.ctx.create_scope(&target.element_type);
                        let body = self.visit(filter, &scope.accessor(), target).map_err(|e| e.within(path))?;
                        Some(Box::new(scope.lambda(body)))
                    }
                };
                Ok(ValueExpr::Any { source: Box::new(member), predicate })
            }),
            FilterExpression::IsType { target: None, derived_type, filter } => {
                self.type_test(current.clone(), resource_type, derived_type, filter.as_deref(), derived_type, None)
            }
            FilterExpression::IsType { target: Some(target), derived_type, filter } => {
                self.walk(target, current, resource_type, &|member, resolved, path| {
                    if !matches!(resolved.field.kind, FieldKind::ToOne { .. }) {
                        return Err(CompileError::mismatch(path, "to-one relationship", resolved.field.describe()));
                    }
                    let target = self.ctx.target_of(resolved, path)?;
                    self.type_test(member, target, derived_type, filter.as_deref(), path, Some(path))
                })
            }
        }
    }

    fn visit_comparison(
        &self,
        left: &QueryValue,
        operator: ComparisonOperator,
        right: &QueryValue,
        current: &ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<ValueExpr, CompileError> {
        match (left, right) {
            (QueryValue::Constant(a), QueryValue::Constant(b)) => {
                Self::check_constants(operator, a, b)?;
                Ok(ValueExpr::compare(ValueExpr::Constant(a.clone()), Self::compare_op(operator), ValueExpr::Constant(b.clone())))
            }
            (QueryValue::Constant(_), _) => self.visit_comparison(right, operator.reversed(), left, current, resource_type),
            (QueryValue::Field(chain), QueryValue::Constant(literal)) => {
                self.walk(chain, current, resource_type, &|member, resolved, path| {
                    Self::check_against_constant(resolved, path, operator, literal)?;
                    Ok(ValueExpr::compare(member, Self::compare_op(operator), ValueExpr::Constant(literal.clone())))
                })
            }
            (QueryValue::Count(chain), QueryValue::Constant(literal)) => {
                self.walk(chain, current, resource_type, &|member, resolved, path| {
                    if !resolved.field.is_to_many() {
                        return Err(CompileError::mismatch(path, "to-many relationship", resolved.field.describe()));
                    }
                    match literal {
                        Literal::Int(_) => {}
                        other => {
                            let found = other.value_type().map(|t| t.to_string()).unwrap_or_else(|| "null".to_string());
                            return Err(CompileError::mismatch(path, ValueType::Int.to_string(), found));
                        }
                    }
                    Ok(ValueExpr::compare(
                        ValueExpr::Count { source: Box::new(member) },
                        Self::compare_op(operator),
                        ValueExpr::Constant(literal.clone()),
                    ))
                })
            }
            _ => {
                let (left_expr, left_type) = self.scalar_operand(left, current, resource_type)?;
                let (right_expr, right_type) = self.scalar_operand(right, current, resource_type)?;
                let path = left.to_string();
                if !(left_type.accepts(right_type) || right_type.accepts(left_type)) {
                    return Err(CompileError::mismatch(right.to_string(), left_type.to_string(), right_type.to_string()));
                }
                if operator.is_ordering() && !left_type.is_orderable() {
                    return Err(CompileError::mismatch(path, "orderable attribute", left_type.to_string()));
                }
                Ok(ValueExpr::compare(left_expr, Self::compare_op(operator), right_expr))
            }
        }
    }

    /// A field or count operand compared against another non-constant
    /// operand. These must denote a single value per element, so to-many
    /// segments are not lifted here.
    fn scalar_operand(
        &self,
        value: &QueryValue,
        current: &ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<(ValueExpr, ValueType), CompileError> {
        match value {
            QueryValue::Constant(literal) => match literal.value_type() {
                Some(value_type) => Ok((ValueExpr::Constant(literal.clone()), value_type)),
                None => Err(CompileError::unsupported("null", "null can only be compared against a field")),
            },
            QueryValue::Field(chain) => {
                let (member, resolved) = self.to_one_path(chain, current, resource_type)?;
                match &resolved.field.kind {
                    FieldKind::Attribute { value_type, .. } => Ok((member, *value_type)),
                    _ => Err(CompileError::mismatch(
                        chain.to_string(),
                        "attribute",
                        resolved.field.describe(),
                    )),
                }
            }
            QueryValue::Count(chain) => {
                let (member, resolved) = self.to_one_path(chain, current, resource_type)?;
                if !resolved.field.is_to_many() {
                    return Err(CompileError::mismatch(chain.to_string(), "to-many relationship", resolved.field.describe()));
                }
                Ok((ValueExpr::Count { source: Box::new(member) }, ValueType::Int))
            }
        }
    }

    fn to_one_path(
        &self,
        chain: &ResourceFieldChain,
        current: &ValueExpr,
        resource_type: &'a ResourceType,
    ) -> Result<(ValueExpr, ResolvedField<'a>), CompileError> {
        FieldResolver::resolve_to_one_path(self.ctx, chain, current.clone(), resource_type).map_err(|err| match err {
            CompileError::UnsupportedQuery { path, .. } => CompileError::unsupported(
                path,
                "comparing two fields across a to-many relationship is not supported",
            ),
            other => other,
        })
    }

    fn type_test(
        &self,
        operand: ValueExpr,
        static_type: &'a ResourceType,
        derived_type: &str,
        filter: Option<&FilterExpression>,
        path: &str,
        relationship: Option<&str>,
    ) -> Result<ValueExpr, CompileError> {
        let derived = self.ctx.resource_type(derived_type)?;
        if !self.ctx.graph.is_same_or_derived(&derived.name, &static_type.name) {
            return Err(CompileError::mismatch(
                path,
                format!("type derived from '{}'", static_type.name),
                derived.name.clone(),
            ));
        }

        let test = ValueExpr::TypeIs { operand: Box::new(operand.clone()), element_type: derived.element_type.clone() };
        match filter {
            None => Ok(test),
            Some(filter) => {
                let cast = ValueExpr::As { operand: Box::new(operand), element_type: derived.element_type.clone() };
                let inner = self.visit(filter, &cast, derived).map_err(|e| match relationship {
                    Some(relationship) => e.within(relationship),
                    None => e,
                })?;
                Ok(ValueExpr::And(vec![test, inner]))
            }
        }
    }

    /// Resolve `chain` from `current`, handing the terminal segment to
    /// `leaf`. To-many segments before the terminal one are lifted into
    /// `Any` with a fresh range variable.
    fn walk(
        &self,
        chain: &ResourceFieldChain,
        current: &ValueExpr,
        resource_type: &'a ResourceType,
        leaf: &LeafFn<'_, 'a>,
    ) -> Result<ValueExpr, CompileError> {
        if chain.is_empty() {
            return Err(CompileError::invalid("", "field chains must not be empty"));
        }
        self.walk_from(chain, 0, current.clone(), resource_type, leaf)
    }

    fn walk_from(
        &self,
        chain: &ResourceFieldChain,
        index: usize,
        current: ValueExpr,
        resource_type: &'a ResourceType,
        leaf: &LeafFn<'_, 'a>,
    ) -> Result<ValueExpr, CompileError> {
        let path = chain.prefix(index + 1);
        let resolved = FieldResolver::resolve(self.ctx.graph, resource_type, &chain.fields[index], &path)?;
        let member = FieldResolver::access(current, &resolved);

        if index + 1 == chain.len() {
            return leaf(member, &resolved, &path);
        }

        match &resolved.field.kind {
            FieldKind::ToOne { .. } => {
                let target = self.ctx.target_of(&resolved, &path)?;
                let _depth = self.ctx.enter(&path)?;
                self.walk_from(chain, index + 1, member, target, leaf)
            }
            FieldKind::ToMany { .. } => {
                let target = self.ctx.target_of(&resolved, &path)?;
                let _depth = self.ctx.enter(&path)?;
                let scope = self.ctx.create_scope(&target.element_type);
                let inner = self.walk_from(chain, index + 1, scope.accessor(), target, leaf)?;
                Ok(ValueExpr::Any { source: Box::new(member), predicate: Some(Box::new(scope.lambda(inner))) })
            }
            FieldKind::Attribute { .. } => Err(CompileError::mismatch(path, "relationship", resolved.field.describe())),
        }
    }

    fn check_against_constant(
        resolved: &ResolvedField<'_>,
        path: &str,
        operator: ComparisonOperator,
        literal: &Literal,
    ) -> Result<(), CompileError> {
        match &resolved.field.kind {
            FieldKind::Attribute { value_type, nullable } => match literal.value_type() {
                None => {
                    if operator.is_ordering() {
                        return Err(CompileError::mismatch(path, "equals or notEquals for null", operator.keyword()));
                    }
                    if !nullable {
                        return Err(CompileError::mismatch(path, value_type.to_string(), "null"));
                    }
                    Ok(())
                }
                Some(found) => {
                    if !value_type.accepts(found) {
                        return Err(CompileError::mismatch(path, value_type.to_string(), found.to_string()));
                    }
                    if operator.is_ordering() && !value_type.is_orderable() {
                        return Err(CompileError::mismatch(path, "orderable attribute", value_type.to_string()));
                    }
                    Ok(())
                }
            },
            FieldKind::ToOne { .. } => {
                if !literal.is_null() || operator.is_ordering() {
                    return Err(CompileError::mismatch(
                        path,
                        "null with equals or notEquals",
                        format!("{}({literal})", operator.keyword()),
                    ));
                }
                Ok(())
            }
            FieldKind::ToMany { .. } => Err(CompileError::mismatch(
                path,
                "attribute or to-one relationship",
                resolved.field.describe(),
            )),
        }
    }

    fn check_constants(operator: ComparisonOperator, left: &Literal, right: &Literal) -> Result<(), CompileError> {
        let path = left.to_string();
        match (left.value_type(), right.value_type()) {
            (Some(a), Some(b)) => {
                if !(a.accepts(b) || b.accepts(a)) {
                    return Err(CompileError::mismatch(path, a.to_string(), b.to_string()));
                }
                if operator.is_ordering() && !a.is_orderable() {
                    return Err(CompileError::mismatch(path, "orderable value", a.to_string()));
                }
                Ok(())
            }
            _ if operator.is_ordering() => Err(CompileError::mismatch(path, "equals or notEquals for null", operator.keyword())),
            _ => Ok(()),
        }
    }

    fn compare_op(operator: ComparisonOperator) -> CompareOp {
        match operator {
            ComparisonOperator::Equals => CompareOp::Eq,
            ComparisonOperator::NotEquals => CompareOp::NotEq,
            ComparisonOperator::LessThan => CompareOp::Lt,
            ComparisonOperator::LessOrEqual => CompareOp::LtEq,
            ComparisonOperator::GreaterThan => CompareOp::Gt,
            ComparisonOperator::GreaterOrEqual => CompareOp::GtEq,
        }
    }

    fn label(filter: &FilterExpression) -> String {
        match filter {
            FilterExpression::Comparison { left: QueryValue::Constant(_), right, .. } => right.to_string(),
            FilterExpression::Comparison { left, .. } => left.to_string(),
            FilterExpression::Logical { operator: LogicalOperator::And, .. } => "and".to_string(),
            FilterExpression::Logical { operator: LogicalOperator::Or, .. } => "or".to_string(),
            FilterExpression::Not(_) => "not".to_string(),
            FilterExpression::MatchText { target, .. }
            | FilterExpression::AnyOf { target, .. }
            | FilterExpression::Has { target, .. } => target.to_string(),
            FilterExpression::IsType { target: Some(target), .. } => target.to_string(),
            FilterExpression::IsType { target: None, derived_type, .. } => derived_type.clone(),
        }
    }
}
