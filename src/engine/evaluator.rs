use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::{
    engine::{EngineError, Helpers, Materializer, MemoryStore, PlanExecutor, TYPE_TAG},
    graph::ResourceTypeProvider,
    model::TextMatchKind,
    plan::{CompareOp, Lambda, ValueExpr},
};

/// Range variables in scope, innermost last.
pub type Env = Vec<(String, Value)>;

/// Evaluates value expressions against JSON resources.
///
/// Member access on null yields null, so a missing to-one relationship
/// propagates instead of failing. Comparisons never match null except
/// `== null` and `!= null`.
#[derive(Clone, Copy)]
pub struct Evaluator<'e> {
    graph: &'e dyn ResourceTypeProvider,
    store: &'e MemoryStore,
}

impl<'e> Evaluator<'e> {
    pub fn new(graph: &'e dyn ResourceTypeProvider, store: &'e MemoryStore) -> Self {
        Self { graph, store }
    }

    /// Evaluate `lambda` with its parameter bound to `argument`.
    pub fn apply(&self, lambda: &Lambda, argument: Value, env: &mut Env) -> Result<Value, EngineError> {
        env.push((lambda.parameter.name.clone(), argument));
        let result = self.eval(&lambda.body, env);
        env.pop();
        result
    }

    pub fn test(&self, lambda: &Lambda, argument: Value, env: &mut Env) -> Result<bool, EngineError> {
        let value = self.apply(lambda, argument, env)?;
        Self::truth(&value, &lambda.body)
    }

    pub fn eval(&self, expr: &ValueExpr, env: &mut Env) -> Result<Value, EngineError> {
        match expr {
            ValueExpr::Parameter(name) => env
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| EngineError::UnboundParameter(name.clone())),
            ValueExpr::Member { target, field } => match self.eval(target, env)? {
                Value::Object(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
                Value::Null => Ok(Value::Null),
                other => Err(EngineError::evaluation(expr, "object", &other)),
            },
            ValueExpr::As { operand, element_type } => {
                let value = self.eval(operand, env)?;
                Ok(if self.is_instance(&value, element_type)? { value } else { Value::Null })
            }
            ValueExpr::TypeIs { operand, element_type } => {
                let value = self.eval(operand, env)?;
                Ok(Value::Bool(self.is_instance(&value, element_type)?))
            }
            ValueExpr::Constant(literal) => Ok(literal.to_json()),
            ValueExpr::Compare { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(Value::Bool(Self::compare(&left, *op, &right)))
            }
            ValueExpr::And(terms) => {
                for term in terms {
                    if !Self::truth(&self.eval(term, env)?, term)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            ValueExpr::Or(terms) => {
                for term in terms {
                    if Self::truth(&self.eval(term, env)?, term)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            ValueExpr::Not(inner) => Ok(Value::Bool(!Self::truth(&self.eval(inner, env)?, inner)?)),
            ValueExpr::TextMatch { operand, kind, value } => match self.eval(operand, env)? {
                Value::String(text) => Ok(Value::Bool(match kind {
                    TextMatchKind::Contains => text.contains(value.as_str()),
                    TextMatchKind::StartsWith => text.starts_with(value.as_str()),
                    TextMatchKind::EndsWith => text.ends_with(value.as_str()),
                })),
                Value::Null => Ok(Value::Bool(false)),
                other => Err(EngineError::evaluation(expr, "string", &other)),
            },
            ValueExpr::InSet { operand, values } => {
                let value = self.eval(operand, env)?;
                Ok(Value::Bool(values.iter().any(|candidate| Helpers::value_equal(&value, &candidate.to_json()))))
            }
            ValueExpr::Any { source, predicate } => {
                let items = self.sequence(source, env)?;
                match predicate {
                    None => Ok(Value::Bool(!items.is_empty())),
                    Some(predicate) => {
                        for item in items {
                            if self.test(predicate, item, env)? {
                                return Ok(Value::Bool(true));
                            }
                        }
                        Ok(Value::Bool(false))
                    }
                }
            }
            ValueExpr::Count { source } => Ok(Value::from(self.sequence(source, env)?.len() as u64)),
            ValueExpr::Conditional { test, if_true, if_false } => {
                if Self::truth(&self.eval(test, env)?, test)? {
                    self.eval(if_true, env)
                } else {
                    self.eval(if_false, env)
                }
            }
            ValueExpr::MemberInit { bindings, .. } => {
                let mut object = Map::new();
                for (name, value) in bindings {
                    object.insert(name.clone(), self.eval(value, env)?);
                }
                Ok(Value::Object(object))
            }
            ValueExpr::Subquery(query) => {
                let rows = PlanExecutor::new(self.graph, self.store).run_in(query, env)?;
                Ok(Value::Array(Materializer::new(self.graph).rows(rows, query)?))
            }
        }
    }

    /// Elements of a to-many relationship; null counts as empty.
    pub fn sequence(&self, source: &ValueExpr, env: &mut Env) -> Result<Vec<Value>, EngineError> {
        match self.eval(source, env)? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(EngineError::evaluation(source, "array", &other)),
        }
    }

    fn is_instance(&self, value: &Value, element_type: &str) -> Result<bool, EngineError> {
        let target = self
            .graph
            .resource_type_for_element(element_type)
            .ok_or_else(|| EngineError::UnknownElementType(element_type.to_string()))?;
        Ok(match value.get(TYPE_TAG).and_then(Value::as_str) {
            Some(concrete) => self.graph.is_same_or_derived(concrete, &target.name),
            None => false,
        })
    }

    fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
        match op {
            CompareOp::Eq => Helpers::value_equal(left, right),
            CompareOp::NotEq => !Helpers::value_equal(left, right),
            _ if left.is_null() || right.is_null() => false,
            CompareOp::Lt => Helpers::cmp_values(left, right) == Some(Ordering::Less),
            CompareOp::LtEq => matches!(Helpers::cmp_values(left, right), Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => Helpers::cmp_values(left, right) == Some(Ordering::Greater),
            CompareOp::GtEq => matches!(Helpers::cmp_values(left, right), Some(Ordering::Greater | Ordering::Equal)),
        }
    }

    fn truth(value: &Value, expr: &ValueExpr) -> Result<bool, EngineError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Null => Ok(false),
            other => Err(EngineError::evaluation(expr, "bool", other)),
        }
    }
}
