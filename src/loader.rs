//! Dataset loader
//!
//! Reads every registered export concurrently. Each read settles on its own
//! into `Some(json)` or `None`; a missing or unreadable file never prevents
//! the other datasets from loading. Results come back in registry order.

use crate::error::EngineError;
use crate::registry::{DatasetDescriptor, DatasetRegistry};
use futures_util::future::join_all;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// A registry entry together with its raw payload, if it could be read
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDataset {
    pub descriptor: DatasetDescriptor,
    pub raw: Option<Value>,
}

impl FetchedDataset {
    pub fn new(descriptor: DatasetDescriptor, raw: Option<Value>) -> Self {
        Self { descriptor, raw }
    }
}

/// Read and parse one export relative to `base_dir`
pub async fn fetch_one(base_dir: &Path, descriptor: &DatasetDescriptor) -> Result<Value, EngineError> {
    let path = base_dir.join(&descriptor.filename);
    let bytes = tokio::fs::read(&path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Fan out one read per dataset and wait for all of them to settle
pub async fn fetch_all(registry: &DatasetRegistry, base_dir: &Path) -> Vec<FetchedDataset> {
    let reads = registry.datasets.iter().map(|descriptor| async move {
        let raw = match fetch_one(base_dir, descriptor).await {
            Ok(raw) => {
                debug!(dataset = %descriptor.id, file = %descriptor.filename, "loaded dataset");
                Some(raw)
            }
            Err(e) => {
                warn!(dataset = %descriptor.id, file = %descriptor.filename, error = %e, "failed to load dataset");
                None
            }
        };
        FetchedDataset::new(descriptor.clone(), raw)
    });

    join_all(reads).await
}
