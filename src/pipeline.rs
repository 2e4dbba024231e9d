//! Pipeline orchestration
//!
//! This module provides the public API of the moment engine. It orchestrates
//! the full pass from raw exported run logs to a ranked analysis report.
//!
//! Pipeline stages:
//! 1. Loader - read every registered export concurrently
//! 2. SchemaAdapter - normalize each payload to canonical records
//! 3. DetectorCatalog - surface moments per dataset
//! 4. Ranking - stable sort by severity × category weight
//! 5. Aggregate - ecosystem statistics over the datasets that normalized

use crate::adapters::{normalize_source, NormalizedSource};
use crate::aggregate::aggregate;
use crate::detectors::DetectorCatalog;
use crate::error::EngineError;
use crate::loader::{fetch_all, FetchedDataset};
use crate::patterns::{self, PatternQualityReport};
use crate::ranking::rank;
use crate::registry::{DatasetDescriptor, DatasetRegistry};
use crate::types::{AnalysisReport, Dataset, NetworkLog, ReportProducer};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Default number of key patterns in a quality report
pub const DEFAULT_KEY_PATTERNS: usize = 5;

/// Datasets that made it through normalization, split by shape
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub datasets: Vec<Dataset>,
    /// Network logs keyed by dataset id, in registry order
    pub networks: Vec<(String, NetworkLog)>,
    /// Ids of datasets that could not be loaded or normalized
    pub skipped: Vec<String>,
}

/// Self-contained analysis input: descriptors plus already-read payloads
///
/// Used where the caller does its own I/O (FFI, tests). A descriptor with no
/// payload is treated like a failed read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub datasets: Vec<DatasetDescriptor>,
    #[serde(default)]
    pub payloads: BTreeMap<String, serde_json::Value>,
}

impl AnalysisBundle {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let bundle: AnalysisBundle = serde_json::from_str(json)?;
        DatasetRegistry::new(bundle.datasets.clone()).validate()?;
        Ok(bundle)
    }

    /// Pair every descriptor with its payload
    pub fn into_fetched(mut self) -> Vec<FetchedDataset> {
        self.datasets
            .into_iter()
            .map(|descriptor| {
                let raw = self.payloads.remove(&descriptor.id);
                FetchedDataset::new(descriptor, raw)
            })
            .collect()
    }
}

/// Runs analysis passes with a fixed detector catalog and producer identity.
///
/// Every pass recomputes from its inputs; the engine keeps no state between
/// calls.
pub struct MomentEngine {
    catalog: DetectorCatalog,
    instance_id: String,
    key_patterns: usize,
}

impl Default for MomentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MomentEngine {
    /// Create an engine with the standard detector catalog
    pub fn new() -> Self {
        Self {
            catalog: DetectorCatalog::new(),
            instance_id: Uuid::new_v4().to_string(),
            key_patterns: DEFAULT_KEY_PATTERNS,
        }
    }

    /// Use a custom detector catalog
    pub fn with_catalog(mut self, catalog: DetectorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Fix the producer instance id (for reproducible output)
    pub fn with_instance_id(mut self, instance_id: &str) -> Self {
        self.instance_id = instance_id.to_string();
        self
    }

    /// Number of key patterns included in quality reports
    pub fn with_key_patterns(mut self, n: usize) -> Self {
        self.key_patterns = n;
        self
    }

    pub fn catalog(&self) -> &DetectorCatalog {
        &self.catalog
    }

    /// Load every dataset in `registry` from `base_dir` and analyze them
    pub async fn run(&self, registry: &DatasetRegistry, base_dir: &Path) -> AnalysisReport {
        info!(datasets = registry.len(), base_dir = %base_dir.display(), "starting analysis");
        let fetched = fetch_all(registry, base_dir).await;
        self.analyze(&fetched)
    }

    /// Analyze a fully self-contained bundle
    pub fn analyze_bundle(&self, bundle: AnalysisBundle) -> AnalysisReport {
        self.analyze(&bundle.into_fetched())
    }

    /// Normalize, detect, rank and aggregate already-fetched datasets
    pub fn analyze(&self, fetched: &[FetchedDataset]) -> AnalysisReport {
        let batch = self.normalize_all(fetched);
        self.report(&batch)
    }

    /// Stage 2: normalize every fetched payload; failures are listed, not raised
    pub fn normalize_all(&self, fetched: &[FetchedDataset]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for item in fetched {
            let descriptor = &item.descriptor;
            let source = item
                .raw
                .as_ref()
                .and_then(|raw| normalize_source(raw, descriptor));

            match source {
                Some(NormalizedSource::Lives(lives)) => batch.datasets.push(Dataset {
                    id: descriptor.id.clone(),
                    label: descriptor.label.clone(),
                    narrative_id: descriptor.narrative_id.clone(),
                    lives,
                }),
                Some(NormalizedSource::Network(log)) => {
                    batch.networks.push((descriptor.id.clone(), log))
                }
                None => batch.skipped.push(descriptor.id.clone()),
            }
        }

        batch
    }

    /// Stages 3-5 over a normalized batch
    pub fn report(&self, batch: &NormalizedBatch) -> AnalysisReport {
        let mut moments = Vec::new();
        for dataset in &batch.datasets {
            let found = self.catalog.detect_lives(&dataset.id, &dataset.lives);
            debug!(dataset = %dataset.id, lives = dataset.lives.len(), moments = found.len(), "detected moments");
            moments.extend(found);
        }
        for (id, log) in &batch.networks {
            let found = self.catalog.detect_network(id, log);
            debug!(dataset = %id, events = log.events.len(), moments = found.len(), "detected network moments");
            moments.extend(found);
        }

        let moments = rank(moments);
        let stats = aggregate(&batch.datasets, &moments);

        info!(
            moments = moments.len(),
            datasets = batch.datasets.len() + batch.networks.len(),
            skipped = batch.skipped.len(),
            "analysis complete"
        );

        AnalysisReport {
            producer: self.producer(),
            computed_at_utc: Utc::now(),
            moments,
            stats,
            skipped: batch.skipped.clone(),
        }
    }

    /// Parse an interaction-pattern corpus and assess its calibration
    pub fn assess_patterns(&self, json: &str) -> Result<PatternQualityReport, EngineError> {
        patterns::assess(json, self.key_patterns)
    }

    fn producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }
}

/// Analyze a JSON [`AnalysisBundle`] and return the report as JSON
pub fn analyze_bundle_json(json: &str) -> Result<String, EngineError> {
    let bundle = AnalysisBundle::from_json(json)?;
    let report = MomentEngine::new().analyze_bundle(bundle);
    serde_json::to_string(&report).map_err(|e| EngineError::Encoding(e.to_string()))
}

/// Assess a pattern corpus and return the quality report as JSON
pub fn assess_patterns_json(json: &str) -> Result<String, EngineError> {
    let report = MomentEngine::new().assess_patterns(json)?;
    serde_json::to_string(&report).map_err(|e| EngineError::Encoding(e.to_string()))
}
