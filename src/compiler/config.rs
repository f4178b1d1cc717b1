use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read compiler config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse compiler config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Compiler configuration.
///
/// - `max_depth` bounds nesting across include trees, filter trees and
///   nested projections; deeper queries fail with `MaxDepthExceeded`.
/// - `always_include_identity` projects the identity field even when the
///   projection does not request it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    pub max_depth: usize,
    pub always_include_identity: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { max_depth: 32, always_include_identity: true }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_identity(mut self, always_include_identity: bool) -> Self {
        self.always_include_identity = always_include_identity;
        self
    }

    /// Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
