use thiserror::Error;

/// Reasons a query layer cannot be compiled. Every variant names the field or
/// relationship path it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unsupported query at '{path}': {reason}")]
    UnsupportedQuery { path: String, reason: String },

    #[error("invalid argument at '{path}': {reason}")]
    InvalidArgument { path: String, reason: String },

    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch { path: String, expected: String, found: String },

    #[error("unknown field '{path}' on resource type '{resource_type}'")]
    UnknownField { resource_type: String, path: String },

    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    #[error("maximum depth of {max_depth} exceeded at '{path}'")]
    MaxDepthExceeded { path: String, max_depth: usize },
}

impl CompileError {
    pub fn path(&self) -> &str {
        match self {
            CompileError::UnsupportedQuery { path, .. }
            | CompileError::InvalidArgument { path, .. }
            | CompileError::TypeMismatch { path, .. }
            | CompileError::UnknownField { path, .. }
            | CompileError::MaxDepthExceeded { path, .. } => path,
            CompileError::UnknownResourceType(name) => name,
        }
    }

    /// Re-root the error path under `relationship`, for errors raised while
    /// compiling a layer or predicate nested inside that relationship.
    pub(crate) fn within(self, relationship: &str) -> Self {
        let nest = |path: String| if path.is_empty() { relationship.to_string() } else { format!("{relationship}.{path}") };
        match self {
            CompileError::UnsupportedQuery { path, reason } => CompileError::UnsupportedQuery { path: nest(path), reason },
            CompileError::InvalidArgument { path, reason } => CompileError::InvalidArgument { path: nest(path), reason },
            CompileError::TypeMismatch { path, expected, found } => CompileError::TypeMismatch { path: nest(path), expected, found },
            CompileError::UnknownField { resource_type, path } => CompileError::UnknownField { resource_type, path: nest(path) },
            CompileError::MaxDepthExceeded { path, max_depth } => CompileError::MaxDepthExceeded { path: nest(path), max_depth },
            other @ CompileError::UnknownResourceType(_) => other,
        }
    }

    pub(crate) fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::UnsupportedQuery { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::InvalidArgument { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn mismatch(path: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        CompileError::TypeMismatch { path: path.into(), expected: expected.into(), found: found.into() }
    }
}
