use std::fmt::{self, Display};

use crate::model::ResourceFieldChain;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortTarget {
    /// Attribute reached through zero or more to-one relationships.
    Field(ResourceFieldChain),
    /// Number of resources in a to-many relationship.
    Count(ResourceFieldChain),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortElementExpression {
    pub target: SortTarget,
    pub ascending: bool,
}

/// Ordered sort keys: the first is the primary order, the rest break ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortExpression {
    pub elements: Vec<SortElementExpression>,
}

impl SortExpression {
    pub fn new(elements: Vec<SortElementExpression>) -> Self {
        Self { elements }
    }

    /// Parse the conventional text form: comma-separated chains, `-` prefix
    /// for descending, `count(chain)` for relationship counts.
    ///
    /// `-createdAt,author.name` sorts newest first, then by author name.
    pub fn parse(text: &str) -> Self {
        let elements = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (ascending, rest) = match part.strip_prefix('-') {
                    Some(rest) => (false, rest),
                    None => (true, part),
                };
                let target = match rest.strip_prefix("count(").and_then(|r| r.strip_suffix(')')) {
                    Some(inner) => SortTarget::Count(ResourceFieldChain::from(inner)),
                    None => SortTarget::Field(ResourceFieldChain::from(rest)),
                };
                SortElementExpression { target, ascending }
            })
            .collect();
        Self { elements }
    }
}

impl SortElementExpression {
    pub fn ascending(chain: &str) -> Self {
        Self { target: SortTarget::Field(ResourceFieldChain::from(chain)), ascending: true }
    }

    pub fn descending(chain: &str) -> Self {
        Self { target: SortTarget::Field(ResourceFieldChain::from(chain)), ascending: false }
    }
}

impl Display for SortElementExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ascending {
            f.write_str("-")?;
        }
        match &self.target {
            SortTarget::Field(chain) => write!(f, "{chain}"),
            SortTarget::Count(chain) => write!(f, "count({chain})"),
        }
    }
}

impl Display for SortExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.elements.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}
