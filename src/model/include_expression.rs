use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use crate::{
    compiler::CompileError,
    model::{IncludeChainConverter, ResourceFieldChain},
};

/// Represents an inclusion tree, such as the one described by the text
/// `owner,articles.revisions`.
///
/// Elements are kept in a sorted set, so equality and hashing ignore the
/// order in which elements were supplied. Siblings that name the same
/// relationship are merged on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IncludeExpression {
    elements: BTreeSet<IncludeElementExpression>,
}

/// One relationship in an inclusion tree, with the inclusions below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IncludeElementExpression {
    pub relationship: String,
    pub children: IncludeExpression,
}

impl IncludeExpression {
    pub const EMPTY: IncludeExpression = IncludeExpression { elements: BTreeSet::new() };

    pub fn new<I>(elements: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = IncludeElementExpression>,
    {
        let elements: Vec<_> = elements.into_iter().collect();
        if elements.is_empty() {
            return Err(CompileError::InvalidArgument {
                path: "include".into(),
                reason: "an include expression requires at least one element; use IncludeExpression::EMPTY instead".into(),
            });
        }
        Ok(Self::normalized(elements))
    }

    /// Convenience for a single-level inclusion of `relationships`.
    pub fn of(relationships: &[&str]) -> Result<Self, CompileError> {
        Self::new(relationships.iter().map(|r| IncludeElementExpression::leaf(r)))
    }

    /// Parse the conventional text form: comma-separated dotted paths, such
    /// as `author.manager,tags`.
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        let chains: Vec<ResourceFieldChain> = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ResourceFieldChain::from)
            .collect();
        IncludeChainConverter::from_chains(&chains)
    }

    pub fn elements(&self) -> impl Iterator<Item = &IncludeElementExpression> {
        self.elements.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// The inclusions below `relationship`, when it is included.
    pub fn child(&self, relationship: &str) -> Option<&IncludeExpression> {
        self.elements.iter().find(|e| e.relationship == relationship).map(|e| &e.children)
    }

    /// Union of two inclusion trees. Shared prefixes appear once.
    pub fn merge(&self, other: &IncludeExpression) -> IncludeExpression {
        Self::normalized(self.elements.iter().chain(other.elements.iter()).cloned())
    }

    fn normalized<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = IncludeElementExpression>,
    {
        let mut by_name: BTreeMap<String, IncludeExpression> = BTreeMap::new();
        for element in elements {
            match by_name.get_mut(&element.relationship) {
                Some(children) => *children = children.merge(&element.children),
                None => {
                    by_name.insert(element.relationship, element.children);
                }
            }
        }
        Self {
            elements: by_name
                .into_iter()
                .map(|(relationship, children)| IncludeElementExpression { relationship, children })
                .collect(),
        }
    }
}

impl Default for IncludeExpression {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Display for IncludeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains: Vec<String> = IncludeChainConverter::to_chains(self).iter().map(|c| c.to_string()).collect();
        chains.sort();
        f.write_str(&chains.join(","))
    }
}

impl IncludeElementExpression {
    pub fn new(relationship: &str, children: IncludeExpression) -> Self {
        Self { relationship: relationship.to_string(), children }
    }

    pub fn leaf(relationship: &str) -> Self {
        Self::new(relationship, IncludeExpression::EMPTY)
    }
}

impl Display for IncludeElementExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_empty() {
            f.write_str(&self.relationship)
        } else {
            write!(f, "{}{{{}}}", self.relationship, self.children)
        }
    }
}
