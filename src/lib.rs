//! Moment Engine - moment detection and calibration analytics for trust/ATP simulation logs
//!
//! The engine turns heterogeneous exported run logs into a ranked list of
//! significant behavioral events through a deterministic pipeline: loading →
//! schema normalization → moment detection → ranking → ecosystem aggregation.
//!
//! ## Modules
//!
//! - **Moment Pipeline**: registry-driven analysis of life and network logs
//! - **Patterns Module**: calibration metrics over interaction-pattern logs
//! - **Timeline**: positional overlays of ranked moments

pub mod adapters;
pub mod aggregate;
pub mod detectors;
pub mod error;
pub mod loader;
pub mod logging;
pub mod patterns;
pub mod pipeline;
pub mod ranking;
pub mod registry;
pub mod timeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapters::{normalize, normalize_source, NormalizedSource, SchemaAdapter};
pub use detectors::{DetectorCatalog, DetectorKind, MomentAccumulator};
pub use error::EngineError;
pub use loader::FetchedDataset;
pub use pipeline::{analyze_bundle_json, assess_patterns_json, AnalysisBundle, MomentEngine};
pub use registry::{DatasetDescriptor, DatasetRegistry, SchemaKind};
pub use types::{AnalysisReport, Dataset, EcosystemStats, LifeRecord, Moment, MomentCategory, Severity};

// Pattern exports
pub use patterns::{InteractionPattern, PatternQualityAnalyzer, PatternQualityReport};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for analysis reports
pub const PRODUCER_NAME: &str = "moment-engine";
