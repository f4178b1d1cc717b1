use std::fmt::{self, Display};

use crate::{
    model::{Literal, TextMatchKind},
    plan::QueryExpr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// A bound range variable: the current element at one traversal depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub element_type: String,
}

/// `parameter => body`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lambda {
    pub parameter: Parameter,
    pub body: ValueExpr,
}

/// Scalar, boolean and object-shaped expressions evaluated per element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueExpr {
    Parameter(String),
    Member { target: Box<ValueExpr>, field: String },
    /// `operand` viewed as `element_type`; null when it is another type.
    As { operand: Box<ValueExpr>, element_type: String },
    TypeIs { operand: Box<ValueExpr>, element_type: String },
    Constant(Literal),
    Compare { left: Box<ValueExpr>, op: CompareOp, right: Box<ValueExpr> },
    And(Vec<ValueExpr>),
    Or(Vec<ValueExpr>),
    Not(Box<ValueExpr>),
    TextMatch { operand: Box<ValueExpr>, kind: TextMatchKind, value: String },
    InSet { operand: Box<ValueExpr>, values: Vec<Literal> },
    Any { source: Box<ValueExpr>, predicate: Option<Box<Lambda>> },
    Count { source: Box<ValueExpr> },
    Conditional { test: Box<ValueExpr>, if_true: Box<ValueExpr>, if_false: Box<ValueExpr> },
    /// `new element_type { name = value, ... }`
    MemberInit { element_type: String, bindings: Vec<(String, ValueExpr)> },
    /// A nested query materialized into a list.
    Subquery(Box<QueryExpr>),
}

impl Lambda {
    pub fn new(parameter: Parameter, body: ValueExpr) -> Self {
        Self { parameter, body }
    }
}

impl ValueExpr {
    pub fn member(target: ValueExpr, field: &str) -> Self {
        ValueExpr::Member { target: Box::new(target), field: field.to_string() }
    }

    pub fn compare(left: ValueExpr, op: CompareOp, right: ValueExpr) -> Self {
        ValueExpr::Compare { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn null() -> Self {
        ValueExpr::Constant(Literal::Null)
    }
}

impl Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.parameter.name, self.body)
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(separator)
}

impl Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Parameter(name) => f.write_str(name),
            ValueExpr::Member { target, field } => write!(f, "{target}.{field}"),
            ValueExpr::As { operand, element_type } => write!(f, "({operand} as {element_type})"),
            ValueExpr::TypeIs { operand, element_type } => write!(f, "({operand} is {element_type})"),
            ValueExpr::Constant(literal) => write!(f, "{literal}"),
            ValueExpr::Compare { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ValueExpr::And(terms) => write!(f, "({})", join(terms, " && ")),
            ValueExpr::Or(terms) => write!(f, "({})", join(terms, " || ")),
            ValueExpr::Not(inner) => write!(f, "!{inner}"),
            ValueExpr::TextMatch { operand, kind, value } => {
                let method = match kind {
                    TextMatchKind::Contains => "Contains",
                    TextMatchKind::StartsWith => "StartsWith",
                    TextMatchKind::EndsWith => "EndsWith",
                };
                write!(f, "{operand}.{method}({value:?})")
            }
            ValueExpr::InSet { operand, values } => write!(f, "({operand} in [{}])", join(values, ", ")),
            ValueExpr::Any { source, predicate: None } => write!(f, "{source}.Any()"),
            ValueExpr::Any { source, predicate: Some(predicate) } => write!(f, "{source}.Any({predicate})"),
            ValueExpr::Count { source } => write!(f, "{source}.Count()"),
            ValueExpr::Conditional { test, if_true, if_false } => write!(f, "({test} ? {if_true} : {if_false})"),
            ValueExpr::MemberInit { element_type, bindings } => {
                let bindings: Vec<String> = bindings.iter().map(|(name, value)| format!("{name} = {value}")).collect();
                write!(f, "new {element_type} {{ {} }}", bindings.join(", "))
            }
            ValueExpr::Subquery(query) => write!(f, "{query}.ToList()"),
        }
    }
}
