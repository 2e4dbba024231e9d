//! Moment ranking
//!
//! Every moment is scored as `severity weight × category weight` and the list
//! is stably sorted by descending score, so ties keep detection order.
//! Filters return sublists of an already ranked sequence and never re-score.

use crate::types::{Moment, MomentCategory, Severity};
use std::cmp::Ordering;

/// Weight of a severity level
pub fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 3.0,
        Severity::High => 2.0,
        Severity::Medium => 1.0,
    }
}

/// Weight of a category
pub fn category_weight(category: MomentCategory) -> f64 {
    match category {
        MomentCategory::Emergence => 2.0,
        MomentCategory::Karma => 1.5,
        MomentCategory::Learning => 1.5,
        MomentCategory::Crisis => 1.0,
        MomentCategory::Trust => 0.8,
        MomentCategory::Atp => 0.5,
    }
}

/// Ranking score of a moment
pub fn score(moment: &Moment) -> f64 {
    severity_weight(moment.severity) * category_weight(moment.category)
}

/// Stable sort by descending score
pub fn rank(mut moments: Vec<Moment>) -> Vec<Moment> {
    moments.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    moments
}

/// Ranked moments of one category, order preserved
pub fn by_category(ranked: &[Moment], category: MomentCategory) -> Vec<&Moment> {
    ranked.iter().filter(|m| m.category == category).collect()
}

/// Ranked moments of one dataset, order preserved
pub fn by_dataset<'a>(ranked: &'a [Moment], simulation_id: &str) -> Vec<&'a Moment> {
    ranked
        .iter()
        .filter(|m| m.simulation_id == simulation_id)
        .collect()
}

/// The `n` highest-ranked moments
pub fn top(ranked: &[Moment], n: usize) -> &[Moment] {
    &ranked[..n.min(ranked.len())]
}
