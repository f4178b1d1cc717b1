use std::fmt::{self, Display};

use crate::compiler::CompileError;

/// Canonical pagination window: skip `skip` elements, then take at most
/// `take` (unlimited when `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PaginationExpression {
    pub skip: u64,
    pub take: Option<u64>,
}

impl PaginationExpression {
    pub fn new(skip: u64, take: Option<u64>) -> Self {
        Self { skip, take }
    }

    pub fn take(take: u64) -> Self {
        Self { skip: 0, take: Some(take) }
    }

    /// Normalize 1-based page number and page size into a skip/take window.
    /// Without a page size every page but the first is past the end.
    pub fn from_page(number: u64, size: Option<u64>) -> Result<Self, CompileError> {
        if number == 0 {
            return Err(CompileError::InvalidArgument {
                path: "page[number]".into(),
                reason: "page numbers start at 1".into(),
            });
        }
        let pagination = match size {
            Some(size) => Self { skip: (number - 1).saturating_mul(size), take: Some(size) },
            None if number == 1 => Self::default(),
            None => Self { skip: u64::MAX, take: None },
        };
        Ok(pagination)
    }
}

impl Display for PaginationExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.take {
            Some(take) => write!(f, "skip={},take={}", self.skip, take),
            None => write!(f, "skip={}", self.skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_page() {
        assert_eq!(PaginationExpression::from_page(1, Some(10)).unwrap(), PaginationExpression::new(0, Some(10)));
        assert_eq!(PaginationExpression::from_page(3, Some(10)).unwrap(), PaginationExpression::new(20, Some(10)));
        assert_eq!(PaginationExpression::from_page(1, None).unwrap(), PaginationExpression::default());
        assert_eq!(PaginationExpression::from_page(2, None).unwrap().skip, u64::MAX);
    }

    #[test]
    fn test_page_zero_is_rejected() {
        assert!(matches!(PaginationExpression::from_page(0, Some(5)), Err(CompileError::InvalidArgument { .. })));
    }
}
