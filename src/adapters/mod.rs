//! Schema adapters
//!
//! This module provides adapters that parse raw exported run logs and map them
//! to canonical life records. Each registered schema kind resolves to exactly
//! one adapter; see [`SchemaKind::adapter`].

mod multi_life;
mod network;
mod summary;

pub use multi_life::MultiLifeAdapter;
pub use network::NetworkLogAdapter;
pub use summary::LifeSummaryAdapter;

use crate::error::EngineError;
use crate::registry::{DatasetDescriptor, SchemaKind};
use crate::types::{LifeRecord, NetworkLog};
use serde_json::Value;
use tracing::{debug, warn};

/// Canonical form of one dataset
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedSource {
    Lives(Vec<LifeRecord>),
    Network(NetworkLog),
}

/// Trait for raw schema adapters
pub trait SchemaAdapter {
    /// Parse a raw JSON document into canonical form
    fn parse(&self, raw: &Value) -> Result<NormalizedSource, EngineError>;
}

/// Normalize a raw payload according to its descriptor.
///
/// Unrecognized or malformed payloads are logged and yield `None`; the caller
/// skips the dataset and carries on with the rest.
pub fn normalize_source(raw: &Value, descriptor: &DatasetDescriptor) -> Option<NormalizedSource> {
    match descriptor.schema.adapter().parse(raw) {
        Ok(source) => {
            debug!(dataset = %descriptor.id, schema = descriptor.schema.as_str(), "normalized dataset");
            Some(source)
        }
        Err(e) => {
            warn!(dataset = %descriptor.id, schema = descriptor.schema.as_str(), error = %e, "skipping malformed dataset");
            None
        }
    }
}

/// Normalize a raw payload into life records.
///
/// Network logs do not fit the life-record model and always yield `None`
/// here; they go through [`normalize_source`] and the network detectors.
pub fn normalize(raw: &Value, descriptor: &DatasetDescriptor) -> Option<Vec<LifeRecord>> {
    if descriptor.schema == SchemaKind::NetworkLog {
        return None;
    }
    match normalize_source(raw, descriptor)? {
        NormalizedSource::Lives(lives) => Some(lives),
        NormalizedSource::Network(_) => None,
    }
}

/// Look up a required object member, failing with the field name
pub(crate) fn required<'a>(raw: &'a Value, field: &str) -> Result<&'a Value, EngineError> {
    raw.get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| EngineError::MissingField(field.to_string()))
}
