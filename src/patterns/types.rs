//! Interaction pattern types
//!
//! An interaction pattern is one logged decision: per-domain epistemic (EP)
//! predictions, the coordinated decision taken, and the observed outcome.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action recommended by a domain or taken by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Proceed,
    Adjust,
    Defer,
}

impl Decision {
    /// Tie-break order for modal decisions
    pub const ALL: [Decision; 3] = [Decision::Proceed, Decision::Adjust, Decision::Defer];
}

/// One domain's prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpPrediction {
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub severity: f64,
    #[serde(default)]
    pub outcome_probability: f64,
    #[serde(default)]
    pub recommended_action: Option<Decision>,
}

/// The decision the coordinator settled on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedDecision {
    /// `None` when the log omits it; such patterns sit outside every decision bucket
    #[serde(default)]
    pub decision: Option<Decision>,
    #[serde(default)]
    pub consensus_strength: f64,
    #[serde(default)]
    pub disagreement_detected: bool,
    #[serde(default)]
    pub cascade_risk: f64,
}

/// What actually happened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub atp_consumed: f64,
    #[serde(default)]
    pub t3_change: f64,
    #[serde(default)]
    pub predictions_accurate: BTreeMap<String, bool>,
}

/// A logged decision instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPattern {
    #[serde(default)]
    pub pattern_id: Option<String>,
    #[serde(default)]
    pub scenario_type: String,
    /// Per-domain context; the set of domains is open
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub ep_predictions: BTreeMap<String, EpPrediction>,
    #[serde(default)]
    pub coordinated_decision: CoordinatedDecision,
    #[serde(default)]
    pub outcome: PatternOutcome,
}

impl InteractionPattern {
    /// Mean confidence across this pattern's domains
    pub fn avg_confidence(&self) -> Option<f64> {
        mean(self.ep_predictions.values().map(|p| p.confidence))
    }

    /// Mean risk across this pattern's domains
    pub fn avg_risk(&self) -> Option<f64> {
        mean(self.ep_predictions.values().map(|p| p.risk))
    }

    pub fn incorrect_predictions(&self) -> usize {
        self.outcome
            .predictions_accurate
            .values()
            .filter(|accurate| !**accurate)
            .count()
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Parse a pattern corpus: a bare array or `{ "patterns": [...] }`
pub fn parse_patterns(json: &str) -> Result<Vec<InteractionPattern>, EngineError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let list = match &value {
        serde_json::Value::Array(_) => &value,
        serde_json::Value::Object(map) => map
            .get("patterns")
            .ok_or_else(|| EngineError::MissingField("patterns".to_string()))?,
        _ => {
            return Err(EngineError::Parse(
                "pattern corpus must be an array or an object with `patterns`".to_string(),
            ))
        }
    };
    Ok(Vec::<InteractionPattern>::deserialize(list)?)
}
