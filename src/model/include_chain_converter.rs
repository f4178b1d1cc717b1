use crate::{
    compiler::CompileError,
    model::{IncludeElementExpression, IncludeExpression, ResourceFieldChain},
};

/// Converts between an inclusion tree and the relationship chains of its
/// leaves.
pub struct IncludeChainConverter;

impl IncludeChainConverter {
    /// Leaf chains of `include`, depth first, siblings in name order.
    ///
    /// `owner,articles.revisions` yields `[articles.revisions, owner]`.
    pub fn to_chains(include: &IncludeExpression) -> Vec<ResourceFieldChain> {
        let mut chains = Vec::new();
        let mut prefix = Vec::new();
        Self::collect(include, &mut prefix, &mut chains);
        chains
    }

    fn collect(include: &IncludeExpression, prefix: &mut Vec<String>, out: &mut Vec<ResourceFieldChain>) {
        for element in include.elements() {
            prefix.push(element.relationship.clone());
            if element.children.is_empty() {
                out.push(ResourceFieldChain::new(prefix.iter().cloned()));
            } else {
                Self::collect(&element.children, prefix, out);
            }
            prefix.pop();
        }
    }

    /// Build an inclusion tree from relationship chains, merging shared
    /// prefixes. No chains yields [`IncludeExpression::EMPTY`].
    pub fn from_chains(chains: &[ResourceFieldChain]) -> Result<IncludeExpression, CompileError> {
        let mut include = IncludeExpression::EMPTY;
        for chain in chains {
            if chain.is_empty() {
                return Err(CompileError::InvalidArgument {
                    path: "include".into(),
                    reason: "relationship chains in an include must not be empty".into(),
                });
            }
            let mut tree = IncludeExpression::EMPTY;
            for relationship in chain.fields.iter().rev() {
                tree = IncludeExpression::new([IncludeElementExpression::new(relationship, tree)])?;
            }
            include = include.merge(&tree);
        }
        Ok(include)
    }
}
