//! Calibration metrics and breakdowns
//!
//! Judges whether the system's own confidence and risk estimates are useful
//! predictors of outcome, and breaks the corpus down by scenario and by EP
//! domain.

use super::analyzer::{learning_improvement, success_rate, KeyPattern, PatternAnalyzer, PatternStatistics};
use super::types::{mean, Decision, InteractionPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum corpus size for calibration; smaller corpora get all-zero metrics
pub const MIN_PATTERNS_FOR_QUALITY: usize = 10;

const HIGH_CONFIDENCE: f64 = 0.7;
const LOW_CONFIDENCE: f64 = 0.4;
const LOW_RISK: f64 = 0.3;
const HIGH_RISK: f64 = 0.6;
const NEUTRAL: f64 = 0.5;
/// Baseline that pre-biases decision effectiveness toward deferring
const DEFER_BASELINE: f64 = 0.7;

/// Calibration metrics, each in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternQualityMetrics {
    pub confidence_reliability: f64,
    pub risk_calibration: f64,
    pub decision_effectiveness: f64,
    pub learning_velocity: f64,
    pub overall_quality: f64,
    pub sample_size: usize,
}

/// Risk bucket of a group's mean risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_risk(risk: f64) -> Self {
        if risk < LOW_RISK {
            RiskLevel::Low
        } else if risk < HIGH_RISK {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Breakdown for one scenario type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub scenario_type: String,
    pub count: usize,
    pub success_rate: f64,
    pub avg_confidence: f64,
    pub avg_risk: f64,
    pub most_common_decision: Option<Decision>,
    pub risk_level: RiskLevel,
}

/// Breakdown for one EP domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub domain: String,
    pub count: usize,
    pub success_rate: f64,
    pub avg_confidence: f64,
    pub avg_risk: f64,
    /// Fraction of this domain's recorded predictions that were accurate
    pub prediction_accuracy: Option<f64>,
    pub most_common_recommendation: Option<Decision>,
    pub risk_level: RiskLevel,
}

/// Everything the quality view needs for one corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternQualityReport {
    pub statistics: PatternStatistics,
    pub metrics: PatternQualityMetrics,
    pub scenarios: Vec<ScenarioAnalysis>,
    pub domains: Vec<DomainAnalysis>,
    pub key_patterns: Vec<KeyPattern>,
}

/// Calibration analyzer over a pattern corpus
pub struct PatternQualityAnalyzer<'a> {
    patterns: &'a [InteractionPattern],
}

impl<'a> PatternQualityAnalyzer<'a> {
    pub fn new(patterns: &'a [InteractionPattern]) -> Self {
        Self { patterns }
    }

    pub fn assess_quality(&self) -> PatternQualityMetrics {
        let patterns = self.patterns;
        if patterns.len() < MIN_PATTERNS_FOR_QUALITY {
            return PatternQualityMetrics {
                sample_size: patterns.len(),
                ..Default::default()
            };
        }

        let confidence_reliability = bucket_contrast(
            patterns,
            |p| p.avg_confidence().is_some_and(|c| c > HIGH_CONFIDENCE),
            |p| p.avg_confidence().is_some_and(|c| c < LOW_CONFIDENCE),
            NEUTRAL,
        );

        // High risk should go with failure, so low-risk success minus
        // high-risk success is the calibrated direction
        let risk_calibration = bucket_contrast(
            patterns,
            |p| p.avg_risk().is_some_and(|r| r < LOW_RISK),
            |p| p.avg_risk().is_some_and(|r| r > HIGH_RISK),
            NEUTRAL,
        );

        let decision_effectiveness = bucket_contrast(
            patterns,
            |p| p.coordinated_decision.decision == Some(Decision::Defer),
            |p| p.coordinated_decision.decision == Some(Decision::Proceed),
            DEFER_BASELINE,
        );

        let learning_velocity = clamp01(2.0 * learning_improvement(patterns));

        let overall_quality = 0.30 * confidence_reliability
            + 0.25 * risk_calibration
            + 0.25 * decision_effectiveness
            + 0.20 * learning_velocity;

        PatternQualityMetrics {
            confidence_reliability,
            risk_calibration,
            decision_effectiveness,
            learning_velocity,
            overall_quality: clamp01(overall_quality),
            sample_size: patterns.len(),
        }
    }

    /// Per-scenario breakdown, largest groups first
    pub fn analyze_scenarios(&self) -> Vec<ScenarioAnalysis> {
        let mut groups: BTreeMap<&str, Vec<&InteractionPattern>> = BTreeMap::new();
        for pattern in self.patterns {
            groups
                .entry(pattern.scenario_type.as_str())
                .or_default()
                .push(pattern);
        }

        let mut scenarios: Vec<ScenarioAnalysis> = groups
            .into_iter()
            .map(|(scenario, group)| {
                let avg_risk = mean(group.iter().filter_map(|p| p.avg_risk())).unwrap_or(0.0);
                ScenarioAnalysis {
                    scenario_type: scenario.to_string(),
                    count: group.len(),
                    success_rate: success_rate(group.iter().copied()).unwrap_or(0.0),
                    avg_confidence: mean(group.iter().filter_map(|p| p.avg_confidence()))
                        .unwrap_or(0.0),
                    avg_risk,
                    most_common_decision: modal(
                        group.iter().filter_map(|p| p.coordinated_decision.decision),
                    ),
                    risk_level: RiskLevel::from_risk(avg_risk),
                }
            })
            .collect();

        // BTreeMap already ordered names; the stable sort keeps that within equal counts
        scenarios.sort_by(|a, b| b.count.cmp(&a.count));
        scenarios
    }

    /// Per-domain breakdown, largest groups first
    pub fn analyze_domains(&self) -> Vec<DomainAnalysis> {
        #[derive(Default)]
        struct DomainAcc<'p> {
            patterns: Vec<&'p InteractionPattern>,
            confidences: Vec<f64>,
            risks: Vec<f64>,
            recommendations: Vec<Decision>,
            accurate: Vec<bool>,
        }

        let mut groups: BTreeMap<&str, DomainAcc<'_>> = BTreeMap::new();
        for pattern in self.patterns {
            for (domain, prediction) in &pattern.ep_predictions {
                let acc = groups.entry(domain.as_str()).or_default();
                acc.patterns.push(pattern);
                acc.confidences.push(prediction.confidence);
                acc.risks.push(prediction.risk);
                acc.recommendations.extend(prediction.recommended_action);
                if let Some(accurate) = pattern.outcome.predictions_accurate.get(domain) {
                    acc.accurate.push(*accurate);
                }
            }
        }

        let mut domains: Vec<DomainAnalysis> = groups
            .into_iter()
            .map(|(domain, acc)| {
                let avg_risk = mean(acc.risks.iter().copied()).unwrap_or(0.0);
                DomainAnalysis {
                    domain: domain.to_string(),
                    count: acc.patterns.len(),
                    success_rate: success_rate(acc.patterns.iter().copied()).unwrap_or(0.0),
                    avg_confidence: mean(acc.confidences.iter().copied()).unwrap_or(0.0),
                    avg_risk,
                    prediction_accuracy: mean(
                        acc.accurate.iter().map(|a| if *a { 1.0 } else { 0.0 }),
                    ),
                    most_common_recommendation: modal(acc.recommendations.into_iter()),
                    risk_level: RiskLevel::from_risk(avg_risk),
                }
            })
            .collect();

        domains.sort_by(|a, b| b.count.cmp(&a.count));
        domains
    }

    /// Statistics, metrics, breakdowns and the `key_patterns` most instructive patterns
    pub fn report(&self, key_patterns: usize) -> PatternQualityReport {
        let analyzer = PatternAnalyzer::new(self.patterns);
        PatternQualityReport {
            statistics: analyzer.statistics(),
            metrics: self.assess_quality(),
            scenarios: self.analyze_scenarios(),
            domains: self.analyze_domains(),
            key_patterns: analyzer.find_key_patterns(key_patterns),
        }
    }
}

/// `clamp01(SR(good) − SR(bad) + baseline)`, or 0.5 if either bucket is empty
fn bucket_contrast(
    patterns: &[InteractionPattern],
    good: impl Fn(&InteractionPattern) -> bool,
    bad: impl Fn(&InteractionPattern) -> bool,
    baseline: f64,
) -> f64 {
    let good_rate = success_rate(patterns.iter().filter(|p| good(*p)));
    let bad_rate = success_rate(patterns.iter().filter(|p| bad(*p)));
    match (good_rate, bad_rate) {
        (Some(g), Some(b)) => clamp01(g - b + baseline),
        _ => NEUTRAL,
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Most frequent decision; ties go to the earlier of proceed, adjust, defer
fn modal(decisions: impl Iterator<Item = Decision>) -> Option<Decision> {
    let mut counts: BTreeMap<Decision, usize> = BTreeMap::new();
    for decision in decisions {
        *counts.entry(decision).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    Decision::ALL
        .into_iter()
        .find(|d| counts.get(d).copied() == Some(best))
}
