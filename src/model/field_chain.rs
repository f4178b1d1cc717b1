use std::fmt::{self, Display};

/// A path of field names, such as `author.manager.name`, to be resolved
/// one segment at a time against the resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourceFieldChain {
    pub fields: Vec<String>,
}

impl ResourceFieldChain {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Dotted form of the first `count` segments.
    pub fn prefix(&self, count: usize) -> String {
        self.fields[..count.min(self.fields.len())].join(".")
    }
}

impl From<&str> for ResourceFieldChain {
    fn from(value: &str) -> Self {
        Self::new(value.split('.').filter(|part| !part.is_empty()))
    }
}

impl Display for ResourceFieldChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join("."))
    }
}
