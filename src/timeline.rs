//! Timeline overlay
//!
//! Places ranked moments on a tick axis spanning a view of lives. The view
//! may be truncated (only the first few lives of a dataset); moments whose
//! life is not in the view, or whose tick falls outside that life's span,
//! are dropped silently.

use crate::types::{Dataset, LifeRecord, Moment, MomentCategory, Severity};
use serde::{Deserialize, Serialize};

/// One moment positioned on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMarker {
    pub moment_id: String,
    pub title: String,
    pub category: MomentCategory,
    pub severity: Severity,
    pub life_number: u32,
    pub tick: u64,
    /// Fraction of the view's tick span, in [0, 1]
    pub position: f64,
}

/// Moments of one dataset over its (possibly truncated) lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineLane {
    pub dataset_id: String,
    pub label: String,
    pub first_tick: u64,
    pub last_tick: u64,
    pub markers: Vec<TimelineMarker>,
}

/// Position `moments` over `lives`, keeping their order
pub fn overlay(lives: &[LifeRecord], moments: &[Moment]) -> Vec<TimelineMarker> {
    let (Some(first), Some(last)) = (
        lives.iter().map(|l| l.start_tick).min(),
        lives.iter().map(|l| l.end_tick).max(),
    ) else {
        return Vec::new();
    };
    let span = last.saturating_sub(first);

    moments
        .iter()
        .filter_map(|moment| {
            let life = lives.iter().find(|l| l.life_number == moment.life_number)?;
            if moment.tick < life.start_tick || moment.tick > life.end_tick {
                return None;
            }
            let position = if span == 0 {
                0.0
            } else {
                (moment.tick - first) as f64 / span as f64
            };
            Some(TimelineMarker {
                moment_id: moment.id.clone(),
                title: moment.title.clone(),
                category: moment.category,
                severity: moment.severity,
                life_number: moment.life_number,
                tick: moment.tick,
                position,
            })
        })
        .collect()
}

/// One lane per dataset, showing at most `max_lives` lives of each
///
/// Only moments whose `simulation_id` matches the dataset land in its lane.
pub fn cross_dataset(
    datasets: &[Dataset],
    moments: &[Moment],
    max_lives: Option<usize>,
) -> Vec<TimelineLane> {
    datasets
        .iter()
        .map(|dataset| {
            let shown = max_lives.map_or(dataset.lives.len(), |n| n.min(dataset.lives.len()));
            let lives = &dataset.lives[..shown];
            let own: Vec<Moment> = moments
                .iter()
                .filter(|m| m.simulation_id == dataset.id)
                .cloned()
                .collect();

            TimelineLane {
                dataset_id: dataset.id.clone(),
                label: dataset.label.clone(),
                first_tick: lives.iter().map(|l| l.start_tick).min().unwrap_or(0),
                last_tick: lives.iter().map(|l| l.end_tick).max().unwrap_or(0),
                markers: overlay(lives, &own),
            }
        })
        .collect()
}
