//! Core types for the moment engine
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: canonical life records, network logs, detected moments, ecosystem
//! statistics and the final analysis report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a life ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    AtpExhaustion,
    TrustCollapse,
    Natural,
    Alive,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::AtpExhaustion => "atp_exhaustion",
            TerminationReason::TrustCollapse => "trust_collapse",
            TerminationReason::Natural => "natural",
            TerminationReason::Alive => "alive",
            TerminationReason::Unknown => "unknown",
        }
    }
}

/// Raw life state reported by some producers alongside the termination reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Alive,
    Dead,
}

/// How history samples map onto the ticks of a life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// One sample per tick from `start_tick`
    #[default]
    PerTick,
    /// Only initial and final values are known; they sit on `start_tick` and `end_tick`
    Endpoints,
}

/// One episode of an agent's existence, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeRecord {
    /// 1-based, sequential within a dataset
    pub life_number: u32,
    pub start_tick: u64,
    pub end_tick: u64,
    /// Trust (T3) samples, conceptually in [0, 1]
    pub trust_history: Vec<f64>,
    /// ATP samples; length is independent of `trust_history`
    pub atp_history: Vec<f64>,
    pub termination_reason: TerminationReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_state: Option<LifeState>,
    #[serde(default)]
    pub sampling: Sampling,
}

impl LifeRecord {
    pub fn initial_trust(&self) -> Option<f64> {
        self.trust_history.first().copied()
    }

    pub fn final_trust(&self) -> Option<f64> {
        self.trust_history.last().copied()
    }

    pub fn initial_atp(&self) -> Option<f64> {
        self.atp_history.first().copied()
    }

    pub fn final_atp(&self) -> Option<f64> {
        self.atp_history.last().copied()
    }

    /// Tick of the `sample`-th history entry, never past `end_tick`
    pub fn sample_tick(&self, sample: usize) -> u64 {
        match self.sampling {
            Sampling::Endpoints if sample > 0 => self.end_tick,
            _ => self
                .start_tick
                .saturating_add(sample as u64)
                .min(self.end_tick),
        }
    }

    pub fn ticks_survived(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// A successfully normalized life-record dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_id: Option<String>,
    pub lives: Vec<LifeRecord>,
}

/// One event in a multi-agent network log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    #[serde(default)]
    pub tick: u64,
    #[serde(rename = "type", alias = "event_type")]
    pub kind: String,
    /// Agents involved, when the producer records them
    #[serde(default, alias = "members")]
    pub agents: Vec<serde_json::Value>,
}

/// Periodic aggregate snapshot of a network run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub tick: u64,
    #[serde(default, alias = "average_trust", alias = "mean_trust")]
    pub avg_trust: Option<f64>,
    #[serde(default, alias = "num_relationships", alias = "edges")]
    pub num_edges: Option<f64>,
    #[serde(default, alias = "coalitions")]
    pub num_coalitions: Option<f64>,
    #[serde(default, alias = "alive_agents")]
    pub num_alive: Option<f64>,
}

/// A multi-agent network log; does not fit the life-record model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkLog {
    #[serde(default)]
    pub num_agents: u32,
    #[serde(default)]
    pub num_ticks: u64,
    #[serde(default)]
    pub events: Vec<NetworkEvent>,
    #[serde(default)]
    pub snapshots: Vec<NetworkSnapshot>,
}

/// Moment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentCategory {
    Trust,
    Atp,
    Karma,
    Learning,
    Crisis,
    Emergence,
}

impl MomentCategory {
    pub const ALL: [MomentCategory; 6] = [
        MomentCategory::Trust,
        MomentCategory::Atp,
        MomentCategory::Karma,
        MomentCategory::Learning,
        MomentCategory::Crisis,
        MomentCategory::Emergence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MomentCategory::Trust => "trust",
            MomentCategory::Atp => "atp",
            MomentCategory::Karma => "karma",
            MomentCategory::Learning => "learning",
            MomentCategory::Crisis => "crisis",
            MomentCategory::Emergence => "emergence",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for MomentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moment severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

/// A value in a moment's evidence map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MomentValue {
    Number(f64),
    Text(String),
}

impl MomentValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MomentValue::Number(n) => Some(*n),
            MomentValue::Text(_) => None,
        }
    }
}

impl From<f64> for MomentValue {
    fn from(value: f64) -> Self {
        MomentValue::Number(value)
    }
}

impl From<u64> for MomentValue {
    fn from(value: u64) -> Self {
        MomentValue::Number(value as f64)
    }
}

impl From<&str> for MomentValue {
    fn from(value: &str) -> Self {
        MomentValue::Text(value.to_string())
    }
}

impl From<String> for MomentValue {
    fn from(value: String) -> Self {
        MomentValue::Text(value)
    }
}

/// A detected, narratively described event in a life's or dataset's series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    /// Deterministic: dataset id + detector + life + index
    pub id: String,
    pub title: String,
    pub narrative: String,
    pub significance: String,
    pub category: MomentCategory,
    pub severity: Severity,
    pub tick: u64,
    /// 0 for dataset-wide (network) moments
    pub life_number: u32,
    pub simulation_id: String,
    /// Numeric evidence behind the narrative
    pub data: BTreeMap<String, MomentValue>,
}

/// Ecosystem-wide summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemStats {
    pub total_datasets: usize,
    pub total_lives: usize,
    pub mean_lives_per_dataset: Option<f64>,
    pub trust_samples: usize,
    pub mean_trust: Option<f64>,
    pub min_trust: Option<f64>,
    pub max_trust: Option<f64>,
    pub total_atp_consumed: f64,
    pub moments_by_category: BTreeMap<MomentCategory, usize>,
    pub moments_by_severity: BTreeMap<Severity, usize>,
    pub lives_by_termination: BTreeMap<TerminationReason, usize>,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete output of one analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub producer: ReportProducer,
    pub computed_at_utc: DateTime<Utc>,
    /// Ranked, most significant first
    pub moments: Vec<Moment>,
    pub stats: EcosystemStats,
    /// Ids of datasets that could not be loaded or normalized
    pub skipped: Vec<String>,
}
