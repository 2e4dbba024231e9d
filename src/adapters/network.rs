//! Network log adapter
//!
//! Multi-agent network logs have no lives; they are passed through as a
//! [`NetworkLog`] for the network detectors.

use crate::error::EngineError;
use crate::types::NetworkLog;
use serde::Deserialize;
use serde_json::Value;

use super::{NormalizedSource, SchemaAdapter};

/// Adapter for `{ num_agents, num_ticks, events, snapshots }`
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkLogAdapter;

impl SchemaAdapter for NetworkLogAdapter {
    fn parse(&self, raw: &Value) -> Result<NormalizedSource, EngineError> {
        let object = raw
            .as_object()
            .ok_or_else(|| EngineError::Parse("network log is not an object".to_string()))?;

        if !object.contains_key("events") && !object.contains_key("snapshots") {
            return Err(EngineError::MissingField("events".to_string()));
        }

        let log = NetworkLog::deserialize(raw)?;
        Ok(NormalizedSource::Network(log))
    }
}
