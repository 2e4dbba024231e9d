//! Dataset registry
//!
//! The registry is the engine's configuration: a fixed list of exported run
//! logs, each naming the file to read and the raw schema it was written in.
//! Schema kinds are declared here and never inferred from payload content.

use crate::adapters::{
    LifeSummaryAdapter, MultiLifeAdapter, NetworkLogAdapter, SchemaAdapter,
};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw JSON shape a dataset was exported in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaKind {
    /// `{ lives: [...] }`
    MultiLife,
    /// `{ <key>: { lives: [...] } }`, used by policy exports
    NestedMultiLife { key: String },
    /// `{ life_summary: {...} }`
    LifeSummary,
    /// `{ num_agents, num_ticks, events, snapshots }`
    NetworkLog,
}

impl SchemaKind {
    /// Strategy lookup: the adapter responsible for this schema kind
    pub fn adapter(&self) -> Box<dyn SchemaAdapter> {
        match self {
            SchemaKind::MultiLife => Box::new(MultiLifeAdapter::top_level()),
            SchemaKind::NestedMultiLife { key } => Box::new(MultiLifeAdapter::nested(key)),
            SchemaKind::LifeSummary => Box::new(LifeSummaryAdapter),
            SchemaKind::NetworkLog => Box::new(NetworkLogAdapter),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::MultiLife => "multi_life",
            SchemaKind::NestedMultiLife { .. } => "nested_multi_life",
            SchemaKind::LifeSummary => "life_summary",
            SchemaKind::NetworkLog => "network_log",
        }
    }
}

/// One registered export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub id: String,
    pub filename: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_id: Option<String>,
    pub schema: SchemaKind,
}

impl DatasetDescriptor {
    pub fn new(id: &str, filename: &str, label: &str, schema: SchemaKind) -> Self {
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            label: label.to_string(),
            narrative_id: None,
            schema,
        }
    }

    pub fn with_narrative(mut self, narrative_id: &str) -> Self {
        self.narrative_id = Some(narrative_id.to_string());
        self
    }
}

/// The full list of datasets an analysis pass reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRegistry {
    pub datasets: Vec<DatasetDescriptor>,
}

impl DatasetRegistry {
    pub fn new(datasets: Vec<DatasetDescriptor>) -> Self {
        Self { datasets }
    }

    /// Load a registry from its JSON form
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let registry: DatasetRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Encoding(e.to_string()))
    }

    /// Moment ids embed the dataset id, so ids must be unique and non-empty
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for descriptor in &self.datasets {
            if descriptor.id.trim().is_empty() {
                return Err(EngineError::MissingField("id".to_string()));
            }
            if descriptor.filename.trim().is_empty() {
                return Err(EngineError::MissingField(format!(
                    "filename (dataset {})",
                    descriptor.id
                )));
            }
            if !seen.insert(descriptor.id.as_str()) {
                return Err(EngineError::Parse(format!(
                    "duplicate dataset id: {}",
                    descriptor.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&DatasetDescriptor> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registry() {
        let json = r#"{
            "datasets": [
                { "id": "sim-a", "filename": "a.json", "label": "Run A",
                  "schema": { "kind": "multi_life" } },
                { "id": "policy", "filename": "policy.json", "label": "Policy",
                  "narrative_id": "policy-story",
                  "schema": { "kind": "nested_multi_life", "key": "results" } },
                { "id": "one", "filename": "one.json", "label": "Summary",
                  "schema": { "kind": "life_summary" } },
                { "id": "net", "filename": "net.json", "label": "Network",
                  "schema": { "kind": "network_log" } }
            ]
        }"#;

        let registry = DatasetRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.get("policy").unwrap().schema,
            SchemaKind::NestedMultiLife {
                key: "results".to_string()
            }
        );
        assert_eq!(
            registry.get("policy").unwrap().narrative_id.as_deref(),
            Some("policy-story")
        );
        assert_eq!(registry.get("net").unwrap().schema.as_str(), "network_log");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let registry = DatasetRegistry::new(vec![
            DatasetDescriptor::new("a", "a.json", "A", SchemaKind::MultiLife),
            DatasetDescriptor::new("a", "b.json", "B", SchemaKind::LifeSummary),
        ]);
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_unknown_schema_kind_rejected() {
        let json = r#"{ "datasets": [
            { "id": "x", "filename": "x.json", "label": "X", "schema": { "kind": "csv" } }
        ] }"#;
        assert!(DatasetRegistry::from_json(json).is_err());
    }
}
