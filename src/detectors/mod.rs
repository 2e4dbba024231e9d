//! Moment detector catalog
//!
//! Detectors are pure rules over one dataset's canonical records. Life
//! detectors run once per life, in life order, and see the immediately
//! preceding life of the same dataset. Network detectors run once per
//! network log.
//!
//! Detectors never share state through closures: anything a rule needs to
//! remember ("has this already fired?") lives in the [`MomentAccumulator`]
//! that is passed into and returned from every call.

mod atp;
mod lineage;
mod network;
mod trust;

pub use atp::{AtpCrisisDetector, DeathByExhaustionDetector};
pub use lineage::{KarmaInheritanceDetector, MaturationDetector};
pub use network::{CoalitionFormationDetector, NetworkEvolutionDetector};
pub use trust::{ThresholdCrossingDetector, TrustCollapseDetector, TrustSurgeDetector};

use crate::types::{LifeRecord, Moment, MomentCategory, MomentValue, NetworkLog, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum |initial − previous final| trust difference reported as karma
pub const KARMA_EPSILON: f64 = 0.001;
/// Relative drop between consecutive samples that counts as a collapse
pub const COLLAPSE_DROP_RATIO: f64 = 0.20;
/// Relative rise between consecutive samples that counts as a surge
pub const SURGE_RISE_RATIO: f64 = 0.15;
/// Fixed consciousness threshold on trust
pub const CONSCIOUSNESS_THRESHOLD: f64 = 0.5;
/// ATP level at or below which a life is in crisis
pub const ATP_CRISIS_LEVEL: f64 = 20.0;
/// Final-trust improvement between consecutive lives that counts as maturation
pub const MATURATION_DELTA: f64 = 0.05;

/// Every kind of moment the catalog can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    KarmaInheritance,
    TrustCollapse,
    TrustSurge,
    ThresholdCrossing,
    AtpCrisis,
    Maturation,
    DeathByExhaustion,
    CoalitionFormation,
    NetworkEvolution,
}

impl DetectorKind {
    /// Short identifier used inside moment ids
    pub fn slug(&self) -> &'static str {
        match self {
            DetectorKind::KarmaInheritance => "karma",
            DetectorKind::TrustCollapse => "collapse",
            DetectorKind::TrustSurge => "surge",
            DetectorKind::ThresholdCrossing => "threshold",
            DetectorKind::AtpCrisis => "atp-crisis",
            DetectorKind::Maturation => "maturation",
            DetectorKind::DeathByExhaustion => "exhaustion",
            DetectorKind::CoalitionFormation => "coalition",
            DetectorKind::NetworkEvolution => "network-evolution",
        }
    }

    pub fn category(&self) -> MomentCategory {
        match self {
            DetectorKind::KarmaInheritance => MomentCategory::Karma,
            DetectorKind::TrustCollapse | DetectorKind::TrustSurge => MomentCategory::Trust,
            DetectorKind::ThresholdCrossing
            | DetectorKind::CoalitionFormation
            | DetectorKind::NetworkEvolution => MomentCategory::Emergence,
            DetectorKind::AtpCrisis | DetectorKind::DeathByExhaustion => MomentCategory::Crisis,
            DetectorKind::Maturation => MomentCategory::Learning,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DetectorKind::KarmaInheritance
            | DetectorKind::TrustCollapse
            | DetectorKind::ThresholdCrossing
            | DetectorKind::DeathByExhaustion
            | DetectorKind::CoalitionFormation => Severity::Critical,
            DetectorKind::TrustSurge
            | DetectorKind::AtpCrisis
            | DetectorKind::Maturation
            | DetectorKind::NetworkEvolution => Severity::High,
        }
    }

    /// Fixed explanation per kind, independent of the evidence
    pub fn significance(&self) -> &'static str {
        match self {
            DetectorKind::KarmaInheritance => {
                "A new life does not start from zero: trust earned or lost before carries over as karma."
            }
            DetectorKind::TrustCollapse => {
                "Trust built over many ticks can be lost in a single step when behavior turns harmful."
            }
            DetectorKind::TrustSurge => {
                "Sharp gains in trust mark moments where consistent cooperation is recognized by peers."
            }
            DetectorKind::ThresholdCrossing => {
                "Crossing the 0.5 trust threshold marks the point where an agent is treated as a reliable participant."
            }
            DetectorKind::AtpCrisis => {
                "Low ATP forces an agent to choose between conserving energy and continuing to contribute."
            }
            DetectorKind::Maturation => {
                "Ending a life with more trust than the previous one shows learning carried across lives."
            }
            DetectorKind::DeathByExhaustion => {
                "Running out of ATP ends a life regardless of reputation; energy budgets bound every action."
            }
            DetectorKind::CoalitionFormation => {
                "Coalitions are emergent structure: trust between individuals becomes collective capability."
            }
            DetectorKind::NetworkEvolution => {
                "The network as a whole changes shape as individual trust relationships accumulate."
            }
        }
    }

    /// Start building a moment of this kind
    pub(crate) fn moment(self, simulation_id: &str, life_number: u32, index: usize) -> MomentBuilder {
        MomentBuilder {
            kind: self,
            simulation_id: simulation_id.to_string(),
            life_number,
            index,
            tick: 0,
            title: String::new(),
            narrative: String::new(),
            data: BTreeMap::new(),
        }
    }
}

/// Assembles a [`Moment`] with a deterministic id
pub(crate) struct MomentBuilder {
    kind: DetectorKind,
    simulation_id: String,
    life_number: u32,
    index: usize,
    tick: u64,
    title: String,
    narrative: String,
    data: BTreeMap<String, MomentValue>,
}

impl MomentBuilder {
    pub(crate) fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub(crate) fn title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    pub(crate) fn narrative(mut self, narrative: String) -> Self {
        self.narrative = narrative;
        self
    }

    pub(crate) fn datum(mut self, key: &str, value: impl Into<MomentValue>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn build(self) -> Moment {
        Moment {
            id: format!(
                "{}-{}-life{}-{}",
                self.simulation_id,
                self.kind.slug(),
                self.life_number,
                self.index
            ),
            title: self.title,
            narrative: self.narrative,
            significance: self.kind.significance().to_string(),
            category: self.kind.category(),
            severity: self.kind.severity(),
            tick: self.tick,
            life_number: self.life_number,
            simulation_id: self.simulation_id,
            data: self.data,
        }
    }
}

/// Moments found so far plus first-occurrence bookkeeping
#[derive(Debug, Clone, Default)]
pub struct MomentAccumulator {
    moments: Vec<Moment>,
    fired: BTreeSet<(DetectorKind, u32)>,
}

impl MomentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, moment: Moment) {
        self.moments.push(moment);
    }

    /// Whether `kind` already fired within `scope` (a life number, or 0 for a whole dataset)
    pub fn has_fired(&self, kind: DetectorKind, scope: u32) -> bool {
        self.fired.contains(&(kind, scope))
    }

    pub fn mark_fired(&mut self, kind: DetectorKind, scope: u32) {
        self.fired.insert((kind, scope));
    }

    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    pub fn len(&self) -> usize {
        self.moments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    pub fn into_moments(self) -> Vec<Moment> {
        self.moments
    }
}

/// What a life detector sees: the life, its position and its predecessor
#[derive(Debug, Clone, Copy)]
pub struct LifeContext<'a> {
    pub simulation_id: &'a str,
    /// 0-based position of `life` within the dataset
    pub index: usize,
    pub life: &'a LifeRecord,
    pub prev: Option<&'a LifeRecord>,
}

impl LifeContext<'_> {
    /// Tick of the `i`-th sample of this life
    pub fn tick_at(&self, sample: usize) -> u64 {
        self.life.sample_tick(sample)
    }
}

/// A rule over one life and its predecessor
pub trait LifeDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(&self, ctx: &LifeContext<'_>, acc: MomentAccumulator) -> MomentAccumulator;
}

/// A rule over a whole network log
pub trait NetworkDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(
        &self,
        simulation_id: &str,
        log: &NetworkLog,
        acc: MomentAccumulator,
    ) -> MomentAccumulator;
}

/// Relative change from `prev` to `curr`; a zero baseline or a non-finite
/// result counts as no change.
pub fn relative_change(prev: f64, curr: f64) -> f64 {
    if prev == 0.0 {
        return 0.0;
    }
    let change = (curr - prev) / prev;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Ordered set of detectors applied to every dataset
pub struct DetectorCatalog {
    life_detectors: Vec<Box<dyn LifeDetector>>,
    network_detectors: Vec<Box<dyn NetworkDetector>>,
}

impl Default for DetectorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorCatalog {
    /// The standard catalog, in emission order
    pub fn new() -> Self {
        Self {
            life_detectors: vec![
                Box::new(KarmaInheritanceDetector),
                Box::new(TrustCollapseDetector),
                Box::new(TrustSurgeDetector),
                Box::new(ThresholdCrossingDetector),
                Box::new(AtpCrisisDetector),
                Box::new(MaturationDetector),
                Box::new(DeathByExhaustionDetector),
            ],
            network_detectors: vec![
                Box::new(CoalitionFormationDetector),
                Box::new(NetworkEvolutionDetector),
            ],
        }
    }

    /// A catalog with no detectors, for composing custom rule sets
    pub fn empty() -> Self {
        Self {
            life_detectors: Vec::new(),
            network_detectors: Vec::new(),
        }
    }

    pub fn with_life_detector(mut self, detector: Box<dyn LifeDetector>) -> Self {
        self.life_detectors.push(detector);
        self
    }

    pub fn with_network_detector(mut self, detector: Box<dyn NetworkDetector>) -> Self {
        self.network_detectors.push(detector);
        self
    }

    pub fn kinds(&self) -> Vec<DetectorKind> {
        self.life_detectors
            .iter()
            .map(|d| d.kind())
            .chain(self.network_detectors.iter().map(|d| d.kind()))
            .collect()
    }

    /// Run every life detector over every life, in life order
    pub fn detect_lives(&self, simulation_id: &str, lives: &[LifeRecord]) -> Vec<Moment> {
        let mut acc = MomentAccumulator::new();

        for (index, life) in lives.iter().enumerate() {
            let ctx = LifeContext {
                simulation_id,
                index,
                life,
                prev: index.checked_sub(1).and_then(|i| lives.get(i)),
            };
            for detector in &self.life_detectors {
                acc = detector.detect(&ctx, acc);
            }
        }

        acc.into_moments()
    }

    /// Run every network detector over one network log
    pub fn detect_network(&self, simulation_id: &str, log: &NetworkLog) -> Vec<Moment> {
        self.network_detectors
            .iter()
            .fold(MomentAccumulator::new(), |acc, detector| {
                detector.detect(simulation_id, log, acc)
            })
            .into_moments()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{LifeRecord, Sampling, TerminationReason};

    pub fn life(number: u32, trust: &[f64], atp: &[f64]) -> LifeRecord {
        let samples = trust.len().max(atp.len()) as u64;
        let start = (number as u64 - 1) * 100;
        LifeRecord {
            life_number: number,
            start_tick: start,
            end_tick: start + samples.saturating_sub(1),
            trust_history: trust.to_vec(),
            atp_history: atp.to_vec(),
            termination_reason: TerminationReason::Unknown,
            life_state: None,
            sampling: Sampling::PerTick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::life;
    use super::*;

    #[test]
    fn test_relative_change_zero_baseline() {
        assert_eq!(relative_change(0.0, 0.7), 0.0);
        assert_eq!(relative_change(0.0, 0.0), 0.0);
        assert_eq!(relative_change(f64::NAN, 0.5), 0.0);
        assert!((relative_change(0.5, 0.3) + 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_moment_ids_are_deterministic() {
        let m = DetectorKind::TrustCollapse.moment("sim-a", 3, 17).tick(217).build();
        assert_eq!(m.id, "sim-a-collapse-life3-17");
        assert_eq!(m.category, MomentCategory::Trust);
        assert_eq!(m.severity, Severity::Critical);
    }

    #[test]
    fn test_catalog_runs_in_life_order() {
        let lives = vec![
            life(1, &[0.5, 0.3], &[]),
            life(2, &[0.3, 0.52], &[]),
        ];
        let moments = DetectorCatalog::new().detect_lives("e2e", &lives);

        let life_numbers: Vec<u32> = moments.iter().map(|m| m.life_number).collect();
        let mut sorted = life_numbers.clone();
        sorted.sort();
        assert_eq!(life_numbers, sorted);
        assert_eq!(moments[0].id, "e2e-collapse-life1-1");
    }

    #[test]
    fn test_same_input_same_moments() {
        let lives = vec![
            life(1, &[0.5, 0.62, 0.3, 0.55], &[100.0, 30.0, 10.0]),
            life(2, &[0.4, 0.7], &[80.0, 60.0]),
        ];
        let catalog = DetectorCatalog::new();
        assert_eq!(
            catalog.detect_lives("d", &lives),
            catalog.detect_lives("d", &lives)
        );
    }

    #[test]
    fn test_tick_at_saturates_and_stays_in_life() {
        let mut far = life(1, &[0.5, 0.3], &[]);
        far.start_tick = u64::MAX - 1;
        far.end_tick = u64::MAX;
        let ctx = LifeContext {
            simulation_id: "d",
            index: 0,
            life: &far,
            prev: None,
        };
        assert_eq!(ctx.tick_at(1), u64::MAX);
        assert_eq!(ctx.tick_at(7), u64::MAX);

        let moments = DetectorCatalog::new().detect_lives("d", &[far.clone()]);
        assert!(moments.iter().all(|m| m.tick == u64::MAX));
    }

    #[test]
    fn test_empty_histories_emit_nothing() {
        let lives = vec![life(1, &[], &[]), life(2, &[], &[])];
        assert!(DetectorCatalog::new().detect_lives("d", &lives).is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = DetectorCatalog::empty().with_life_detector(Box::new(TrustSurgeDetector));
        assert_eq!(catalog.kinds(), vec![DetectorKind::TrustSurge]);
        let moments = catalog.detect_lives("d", &[life(1, &[0.5, 0.3, 0.6], &[])]);
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].category, MomentCategory::Trust);
    }
}
