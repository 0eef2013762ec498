use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{session::SpillConfig, spill::{InMemorySpillStore, JsonFileSpillStore, SpillStore}};

/// Ambient per-query context handed to every bind call.
///
/// The aggregation layer only reads the spill settings; everything else is
/// carried through for accumulators that want it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub query_id: String,
    pub user: String,
    pub properties: IndexMap<String, Value>,
    pub spill: SpillConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            query_id: Uuid::new_v4().to_string(),
            user: "fosk".to_string(),
            properties: IndexMap::new(),
            spill: SpillConfig::default(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spill(mut self, spill: SpillConfig) -> Self {
        self.spill = spill;
        self
    }

    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Parse a session from JSON; missing keys take their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn create_spill_store(&self) -> Box<dyn SpillStore> {
        match &self.spill.spill_path {
            Some(path) => Box::new(JsonFileSpillStore::new(path.clone())),
            None => Box::new(InMemorySpillStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_fills_defaults() {
        let session = Session::from_json(r#"{ "user": "ana", "spill": { "memory_threshold_bytes": 1024 } }"#).unwrap();
        assert_eq!(session.user, "ana");
        assert_eq!(session.spill.memory_threshold_bytes, 1024);
        assert_eq!(session.spill.spill_path, None);
        assert!(!session.query_id.is_empty());
    }

    #[test]
    fn properties_keep_insertion_order() {
        let session = Session::new()
            .with_property("b", json!(1))
            .with_property("a", json!(2));
        let keys: Vec<_> = session.properties.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(session.property("a"), Some(&json!(2)));
    }
}
