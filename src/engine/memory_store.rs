use std::sync::RwLock;

use indexmap::IndexMap;
use serde_json::Value;

use crate::engine::EngineError;

/// Key holding the concrete resource type of a stored object.
pub const TYPE_TAG: &str = "$type";

/// Resources held in memory, keyed by their concrete resource type and kept
/// in insertion order.
///
/// Related resources are stored embedded in their owner: a to-one
/// relationship holds an object (or null), a to-many relationship an array.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<IndexMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource_type: &str, item: Value) -> Result<(), EngineError> {
        if !item.is_object() {
            return Err(EngineError::InvalidData(format!("resources of '{resource_type}' must be JSON objects")));
        }
        let mut collections = self.collections.write().map_err(|_| EngineError::StorePoisoned)?;
        collections.entry(resource_type.to_string()).or_default().push(item);
        Ok(())
    }

    /// Items of exactly `resource_type`; derived types are stored apart.
    pub fn items(&self, resource_type: &str) -> Result<Vec<Value>, EngineError> {
        let collections = self.collections.read().map_err(|_| EngineError::StorePoisoned)?;
        Ok(collections.get(resource_type).cloned().unwrap_or_default())
    }

    pub fn len(&self, resource_type: &str) -> Result<usize, EngineError> {
        let collections = self.collections.read().map_err(|_| EngineError::StorePoisoned)?;
        Ok(collections.get(resource_type).map_or(0, Vec::len))
    }

    pub fn resource_types(&self) -> Result<Vec<String>, EngineError> {
        let collections = self.collections.read().map_err(|_| EngineError::StorePoisoned)?;
        Ok(collections.keys().cloned().collect())
    }

    pub fn clear(&self) -> Result<(), EngineError> {
        let mut collections = self.collections.write().map_err(|_| EngineError::StorePoisoned)?;
        collections.clear();
        Ok(())
    }
}
