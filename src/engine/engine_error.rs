use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    #[error("unknown element type '{0}'")]
    UnknownElementType(String),

    #[error("unbound range variable '{0}'")]
    UnboundParameter(String),

    #[error("cannot evaluate '{expression}': expected {expected}, found {found}")]
    Evaluation { expression: String, expected: String, found: String },

    #[error("invalid resource data: {0}")]
    InvalidData(String),

    #[error("failed to parse resource data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("resource store lock poisoned")]
    StorePoisoned,
}

impl EngineError {
    pub(crate) fn evaluation(expression: impl ToString, expected: &str, found: &serde_json::Value) -> Self {
        let found = match found {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        EngineError::Evaluation { expression: expression.to_string(), expected: expected.to_string(), found: found.to_string() }
    }
}
