//! Corpus statistics and key-pattern selection
//!
//! The corpus is assumed to be in chronological order and is never re-sorted.

use super::types::{mean, Decision, InteractionPattern};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Summary statistics over a pattern corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternStatistics {
    pub total_patterns: usize,
    pub success_rate: f64,
    /// Mean over every domain confidence of every pattern
    pub avg_confidence: f64,
    pub prediction_accuracy: f64,
    /// Last-quartile success rate minus first-quartile success rate
    pub learning_improvement: f64,
    pub disagreement_rate: f64,
    pub avg_atp_consumed: f64,
    pub avg_t3_change: f64,
    pub decision_distribution: BTreeMap<Decision, usize>,
}

/// A pattern singled out as instructive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPattern {
    /// Position in the corpus
    pub index: usize,
    pub score: f64,
    pub pattern: InteractionPattern,
}

/// Read-only analyzer over a pattern corpus
pub struct PatternAnalyzer<'a> {
    patterns: &'a [InteractionPattern],
}

impl<'a> PatternAnalyzer<'a> {
    pub fn new(patterns: &'a [InteractionPattern]) -> Self {
        Self { patterns }
    }

    pub fn statistics(&self) -> PatternStatistics {
        let patterns = self.patterns;
        if patterns.is_empty() {
            return PatternStatistics::default();
        }

        let mut decision_distribution = BTreeMap::new();
        for decision in patterns.iter().filter_map(|p| p.coordinated_decision.decision) {
            *decision_distribution.entry(decision).or_insert(0) += 1;
        }

        let avg_confidence = mean(
            patterns
                .iter()
                .flat_map(|p| p.ep_predictions.values().map(|e| e.confidence)),
        )
        .unwrap_or(0.0);

        let prediction_accuracy = mean(patterns.iter().filter_map(|p| {
            let total = p.outcome.predictions_accurate.len();
            (total > 0).then(|| {
                let accurate = total - p.incorrect_predictions();
                accurate as f64 / total as f64
            })
        }))
        .unwrap_or(0.0);

        PatternStatistics {
            total_patterns: patterns.len(),
            success_rate: success_rate(patterns.iter()).unwrap_or(0.0),
            avg_confidence,
            prediction_accuracy,
            learning_improvement: learning_improvement(patterns),
            disagreement_rate: fraction(patterns.iter(), |p| {
                p.coordinated_decision.disagreement_detected
            }),
            avg_atp_consumed: mean(patterns.iter().map(|p| p.outcome.atp_consumed)).unwrap_or(0.0),
            avg_t3_change: mean(patterns.iter().map(|p| p.outcome.t3_change)).unwrap_or(0.0),
            decision_distribution,
        }
    }

    /// Instructiveness score of one pattern
    pub fn key_score(pattern: &InteractionPattern) -> f64 {
        let decision = &pattern.coordinated_decision;
        let mut score = decision.cascade_risk;
        if decision.disagreement_detected {
            score += 2.0;
        }
        score += 0.5 * pattern.incorrect_predictions() as f64;
        if pattern.avg_risk().is_some_and(|risk| risk > 0.6) {
            score += 1.0;
        }
        score
    }

    /// The `n` most instructive patterns, highest score first (stable on ties)
    pub fn find_key_patterns(&self, n: usize) -> Vec<KeyPattern> {
        let mut scored: Vec<KeyPattern> = self
            .patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| KeyPattern {
                index,
                score: Self::key_score(pattern),
                pattern: pattern.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(n);
        scored
    }
}

/// Fraction of successful outcomes; `None` for an empty set
pub fn success_rate<'p>(patterns: impl Iterator<Item = &'p InteractionPattern>) -> Option<f64> {
    mean(patterns.map(|p| if p.outcome.success { 1.0 } else { 0.0 }))
}

fn fraction<'p>(
    patterns: impl Iterator<Item = &'p InteractionPattern>,
    predicate: impl Fn(&InteractionPattern) -> bool,
) -> f64 {
    mean(patterns.map(|p| if predicate(p) { 1.0 } else { 0.0 })).unwrap_or(0.0)
}

/// Last-quartile success rate minus first-quartile success rate, in corpus order
pub fn learning_improvement(patterns: &[InteractionPattern]) -> f64 {
    let quartile = patterns.len() / 4;
    if quartile == 0 {
        return 0.0;
    }
    let first = success_rate(patterns[..quartile].iter()).unwrap_or(0.0);
    let last = success_rate(patterns[patterns.len() - quartile..].iter()).unwrap_or(0.0);
    last - first
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::super::types::*;
    use std::collections::BTreeMap;

    pub struct PatternShape {
        pub scenario: &'static str,
        pub confidence: f64,
        pub risk: f64,
        pub decision: Decision,
        pub success: bool,
    }

    pub fn pattern(shape: PatternShape) -> InteractionPattern {
        let mut ep_predictions = BTreeMap::new();
        for domain in ["emotional", "quality"] {
            ep_predictions.insert(
                domain.to_string(),
                EpPrediction {
                    confidence: shape.confidence,
                    risk: shape.risk,
                    severity: 0.2,
                    outcome_probability: 0.5,
                    recommended_action: Some(shape.decision),
                },
            );
        }
        let mut predictions_accurate = BTreeMap::new();
        predictions_accurate.insert("emotional".to_string(), shape.success);
        predictions_accurate.insert("quality".to_string(), true);

        InteractionPattern {
            pattern_id: None,
            scenario_type: shape.scenario.to_string(),
            context: BTreeMap::new(),
            ep_predictions,
            coordinated_decision: CoordinatedDecision {
                decision: Some(shape.decision),
                consensus_strength: 0.7,
                disagreement_detected: false,
                cascade_risk: 0.1,
            },
            outcome: PatternOutcome {
                success: shape.success,
                atp_consumed: 5.0,
                t3_change: if shape.success { 0.01 } else { -0.02 },
                predictions_accurate,
            },
        }
    }

    pub fn simple(success: bool) -> InteractionPattern {
        pattern(PatternShape {
            scenario: "routine",
            confidence: 0.5,
            risk: 0.4,
            decision: Decision::Adjust,
            success,
        })
    }
}
