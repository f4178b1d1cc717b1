use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::model::{Literal, ResourceFieldChain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl ComparisonOperator {
    /// The operator that gives the same result with operands swapped.
    pub fn reversed(self) -> Self {
        use ComparisonOperator::*;
        match self {
            Equals => Equals,
            NotEquals => NotEquals,
            LessThan => GreaterThan,
            LessOrEqual => GreaterOrEqual,
            GreaterThan => LessThan,
            GreaterOrEqual => LessOrEqual,
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, ComparisonOperator::Equals | ComparisonOperator::NotEquals)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "equals",
            ComparisonOperator::NotEquals => "notEquals",
            ComparisonOperator::LessThan => "lessThan",
            ComparisonOperator::LessOrEqual => "lessOrEqual",
            ComparisonOperator::GreaterThan => "greaterThan",
            ComparisonOperator::GreaterOrEqual => "greaterOrEqual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextMatchKind {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextMatchKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TextMatchKind::Contains => "contains",
            TextMatchKind::StartsWith => "startsWith",
            TextMatchKind::EndsWith => "endsWith",
        }
    }
}

/// An operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryValue {
    Field(ResourceFieldChain),
    Constant(Literal),
    /// Number of resources in a to-many relationship.
    Count(ResourceFieldChain),
}

impl QueryValue {
    pub fn field(chain: &str) -> Self {
        QueryValue::Field(ResourceFieldChain::from(chain))
    }

    pub fn count(chain: &str) -> Self {
        QueryValue::Count(ResourceFieldChain::from(chain))
    }
}

impl From<Literal> for QueryValue {
    fn from(value: Literal) -> Self {
        QueryValue::Constant(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Constant(Literal::Int(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Constant(Literal::Bool(value))
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Constant(Literal::string(value))
    }
}

/// Predicate tree of a query layer.
///
/// Field chains are names only; they are resolved against the resource graph
/// when the filter is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterExpression {
    Comparison { left: QueryValue, operator: ComparisonOperator, right: QueryValue },
    Logical { operator: LogicalOperator, terms: Vec<FilterExpression> },
    Not(Box<FilterExpression>),
    MatchText { target: ResourceFieldChain, kind: TextMatchKind, value: String },
    /// Attribute equals one of `constants`.
    AnyOf { target: ResourceFieldChain, constants: BTreeSet<Literal> },
    /// To-many relationship has at least one resource, optionally one that
    /// matches `filter`.
    Has { target: ResourceFieldChain, filter: Option<Box<FilterExpression>> },
    /// The resource (or the to-one relationship `target`) is of
    /// `derived_type`, optionally matching `filter` evaluated as that type.
    IsType { target: Option<ResourceFieldChain>, derived_type: String, filter: Option<Box<FilterExpression>> },
}

impl FilterExpression {
    pub fn compare(left: impl Into<QueryValue>, operator: ComparisonOperator, right: impl Into<QueryValue>) -> Self {
        FilterExpression::Comparison { left: left.into(), operator, right: right.into() }
    }

    /// `chain == value`
    pub fn equals(chain: &str, value: impl Into<Literal>) -> Self {
        Self::compare(QueryValue::field(chain), ComparisonOperator::Equals, QueryValue::Constant(value.into()))
    }

    pub fn and(terms: Vec<FilterExpression>) -> Self {
        FilterExpression::Logical { operator: LogicalOperator::And, terms }
    }

    pub fn or(terms: Vec<FilterExpression>) -> Self {
        FilterExpression::Logical { operator: LogicalOperator::Or, terms }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: FilterExpression) -> Self {
        FilterExpression::Not(Box::new(filter))
    }

    pub fn match_text(chain: &str, kind: TextMatchKind, value: &str) -> Self {
        FilterExpression::MatchText { target: ResourceFieldChain::from(chain), kind, value: value.to_string() }
    }

    pub fn any_of<I: IntoIterator<Item = Literal>>(chain: &str, constants: I) -> Self {
        FilterExpression::AnyOf { target: ResourceFieldChain::from(chain), constants: constants.into_iter().collect() }
    }

    pub fn has(chain: &str, filter: Option<FilterExpression>) -> Self {
        FilterExpression::Has { target: ResourceFieldChain::from(chain), filter: filter.map(Box::new) }
    }

    pub fn is_type(chain: Option<&str>, derived_type: &str, filter: Option<FilterExpression>) -> Self {
        FilterExpression::IsType {
            target: chain.map(ResourceFieldChain::from),
            derived_type: derived_type.to_string(),
            filter: filter.map(Box::new),
        }
    }
}

fn write_constant(f: &mut fmt::Formatter<'_>, literal: &Literal) -> fmt::Result {
    match literal {
        Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        other => write!(f, "{}", other),
    }
}

impl Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Field(chain) => write!(f, "{chain}"),
            QueryValue::Constant(literal) => write_constant(f, literal),
            QueryValue::Count(chain) => write!(f, "count({chain})"),
        }
    }
}

impl Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::Comparison { left, operator, right } => write!(f, "{}({left},{right})", operator.keyword()),
            FilterExpression::Logical { operator, terms } => {
                let keyword = match operator { LogicalOperator::And => "and", LogicalOperator::Or => "or" };
                let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
                write!(f, "{keyword}({})", terms.join(","))
            }
            FilterExpression::Not(inner) => write!(f, "not({inner})"),
            FilterExpression::MatchText { target, kind, value } => {
                write!(f, "{}({target},", kind.keyword())?;
                write_constant(f, &Literal::string(value))?;
                write!(f, ")")
            }
            FilterExpression::AnyOf { target, constants } => {
                write!(f, "any({target}")?;
                for constant in constants {
                    write!(f, ",")?;
                    write_constant(f, constant)?;
                }
                write!(f, ")")
            }
            FilterExpression::Has { target, filter: None } => write!(f, "has({target})"),
            FilterExpression::Has { target, filter: Some(filter) } => write!(f, "has({target},{filter})"),
            FilterExpression::IsType { target, derived_type, filter } => {
                write!(f, "isType(")?;
                if let Some(target) = target {
                    write!(f, "{target}")?;
                }
                write!(f, ",{derived_type}")?;
                if let Some(filter) = filter {
                    write!(f, ",{filter}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_operators() {
        assert_eq!(ComparisonOperator::LessThan.reversed(), ComparisonOperator::GreaterThan);
        assert_eq!(ComparisonOperator::GreaterOrEqual.reversed(), ComparisonOperator::LessOrEqual);
        assert_eq!(ComparisonOperator::Equals.reversed(), ComparisonOperator::Equals);
    }

    #[test]
    fn test_display_uses_query_string_syntax() {
        let filter = FilterExpression::and(vec![
            FilterExpression::equals("author.name", "O'Brien"),
            FilterExpression::compare(QueryValue::count("revisions"), ComparisonOperator::GreaterThan, 2i64),
            FilterExpression::not(FilterExpression::has("tags", None)),
        ]);
        assert_eq!(filter.to_string(), "and(equals(author.name,'O''Brien'),greaterThan(count(revisions),2),not(has(tags)))");
    }

    #[test]
    fn test_display_is_type_and_any() {
        let filter = FilterExpression::is_type(None, "blogs", Some(FilterExpression::any_of("url", vec![Literal::string("b"), Literal::string("a")])));
        assert_eq!(filter.to_string(), "isType(,blogs,any(url,'a','b'))");
    }
}
