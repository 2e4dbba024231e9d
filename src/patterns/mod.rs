//! Interaction pattern quality analysis
//!
//! An independent pipeline over logged decisions: summary statistics,
//! key-pattern selection, calibration metrics and scenario/domain breakdowns.
//! It shares no state with moment detection.

mod analyzer;
mod quality;
mod types;

pub use analyzer::{learning_improvement, success_rate, KeyPattern, PatternAnalyzer, PatternStatistics};
pub use quality::{
    DomainAnalysis, PatternQualityAnalyzer, PatternQualityMetrics, PatternQualityReport,
    RiskLevel, ScenarioAnalysis, MIN_PATTERNS_FOR_QUALITY,
};
pub use types::{
    parse_patterns, CoordinatedDecision, Decision, EpPrediction, InteractionPattern,
    PatternOutcome,
};

/// Parse a corpus and build its full quality report
pub fn assess(json: &str, key_patterns: usize) -> Result<PatternQualityReport, crate::EngineError> {
    let patterns = parse_patterns(json)?;
    tracing::debug!(patterns = patterns.len(), "assessing pattern corpus");
    Ok(PatternQualityAnalyzer::new(&patterns).report(key_patterns))
}
