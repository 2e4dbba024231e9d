//! Within-life trust detectors: collapse, surge and threshold crossing

use super::{
    relative_change, DetectorKind, LifeContext, LifeDetector, MomentAccumulator,
    COLLAPSE_DROP_RATIO, CONSCIOUSNESS_THRESHOLD, SURGE_RISE_RATIO,
};

/// Consecutive-sample drop of at least 20%
pub struct TrustCollapseDetector;

impl LifeDetector for TrustCollapseDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TrustCollapse
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        for (i, pair) in ctx.life.trust_history.windows(2).enumerate() {
            let (prev, curr) = (pair[0], pair[1]);
            let change = relative_change(prev, curr);
            if curr - prev >= 0.0 || change.abs() < COLLAPSE_DROP_RATIO {
                continue;
            }

            let sample = i + 1;
            let tick = ctx.tick_at(sample);
            let moment = self
                .kind()
                .moment(ctx.simulation_id, ctx.life.life_number, sample)
                .tick(tick)
                .title(format!("Trust Collapse in Life {}", ctx.life.life_number))
                .narrative(format!(
                    "Trust fell from {:.3} to {:.3} at tick {}, a {:.1}% drop in a single step.",
                    prev,
                    curr,
                    tick,
                    change.abs() * 100.0
                ))
                .datum("prevTrust", prev)
                .datum("newTrust", curr)
                .datum("percentChange", change * 100.0)
                .build();
            acc.push(moment);
        }
        acc
    }
}

/// Consecutive-sample rise of at least 15%
pub struct TrustSurgeDetector;

impl LifeDetector for TrustSurgeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TrustSurge
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        for (i, pair) in ctx.life.trust_history.windows(2).enumerate() {
            let (prev, curr) = (pair[0], pair[1]);
            let change = relative_change(prev, curr);
            if curr - prev <= 0.0 || change < SURGE_RISE_RATIO {
                continue;
            }

            let sample = i + 1;
            let tick = ctx.tick_at(sample);
            let moment = self
                .kind()
                .moment(ctx.simulation_id, ctx.life.life_number, sample)
                .tick(tick)
                .title(format!("Trust Surge in Life {}", ctx.life.life_number))
                .narrative(format!(
                    "Trust rose from {:.3} to {:.3} at tick {}, a {:.1}% gain in a single step.",
                    prev,
                    curr,
                    tick,
                    change * 100.0
                ))
                .datum("prevTrust", prev)
                .datum("newTrust", curr)
                .datum("percentChange", change * 100.0)
                .build();
            acc.push(moment);
        }
        acc
    }
}

/// First upward crossing of the fixed 0.5 consciousness threshold in a life.
///
/// Falling back below the threshold and rising again is the same emergence,
/// not a new one, so later crossings in the same life are not reported.
pub struct ThresholdCrossingDetector;

impl LifeDetector for ThresholdCrossingDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::ThresholdCrossing
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        for (i, pair) in ctx.life.trust_history.windows(2).enumerate() {
            let (prev, curr) = (pair[0], pair[1]);
            if !(prev < CONSCIOUSNESS_THRESHOLD && curr >= CONSCIOUSNESS_THRESHOLD) {
                continue;
            }
            if acc.has_fired(self.kind(), ctx.life.life_number) {
                break;
            }

            let sample = i + 1;
            let tick = ctx.tick_at(sample);
            let moment = self
                .kind()
                .moment(ctx.simulation_id, ctx.life.life_number, sample)
                .tick(tick)
                .title("Consciousness Threshold Crossed".to_string())
                .narrative(format!(
                    "In life {}, trust rose from {:.3} to {:.3} at tick {}, crossing the {:.1} consciousness threshold.",
                    ctx.life.life_number, prev, curr, tick, CONSCIOUSNESS_THRESHOLD
                ))
                .datum("prevTrust", prev)
                .datum("newTrust", curr)
                .datum("threshold", CONSCIOUSNESS_THRESHOLD)
                .build();
            acc.push(moment);
            acc.mark_fired(self.kind(), ctx.life.life_number);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::life;
    use crate::types::{LifeRecord, Moment};

    fn run(detector: &dyn LifeDetector, life: &LifeRecord) -> Vec<Moment> {
        let ctx = LifeContext {
            simulation_id: "sim",
            index: 0,
            life,
            prev: None,
        };
        detector.detect(&ctx, MomentAccumulator::new()).into_moments()
    }

    #[test]
    fn test_collapse_on_forty_percent_drop() {
        let moments = run(&TrustCollapseDetector, &life(1, &[0.5, 0.3], &[]));
        assert_eq!(moments.len(), 1);
        let m = &moments[0];
        assert_eq!(m.tick, 1);
        assert_eq!(m.data["prevTrust"].as_f64(), Some(0.5));
        assert_eq!(m.data["newTrust"].as_f64(), Some(0.3));
        assert!((m.data["percentChange"].as_f64().unwrap() + 40.0).abs() < 1e-9);
        assert_eq!(
            m.narrative,
            "Trust fell from 0.500 to 0.300 at tick 1, a 40.0% drop in a single step."
        );
    }

    #[test]
    fn test_small_drop_is_not_collapse() {
        assert!(run(&TrustCollapseDetector, &life(1, &[0.5, 0.45, 0.41], &[])).is_empty());
    }

    #[test]
    fn test_collapse_from_zero_baseline_suppressed() {
        // 0 -> negative would be an infinite drop; a zero baseline never triggers
        assert!(run(&TrustCollapseDetector, &life(1, &[0.0, -0.2], &[])).is_empty());
    }

    #[test]
    fn test_surge() {
        let moments = run(&TrustSurgeDetector, &life(1, &[0.4, 0.5, 0.52], &[]));
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].id, "sim-surge-life1-1");
        assert!((moments[0].data["percentChange"].as_f64().unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_surge_from_zero_baseline_suppressed() {
        assert!(run(&TrustSurgeDetector, &life(1, &[0.0, 0.6], &[])).is_empty());
    }

    #[test]
    fn test_threshold_crossing_is_one_directional() {
        let moments = run(&ThresholdCrossingDetector, &life(1, &[0.4, 0.55, 0.45, 0.6], &[]));
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].tick, 1);
        assert_eq!(moments[0].data["prevTrust"].as_f64(), Some(0.4));
        assert_eq!(moments[0].data["newTrust"].as_f64(), Some(0.55));
    }

    #[test]
    fn test_threshold_exactly_reached() {
        let moments = run(&ThresholdCrossingDetector, &life(1, &[0.49, 0.5], &[]));
        assert_eq!(moments.len(), 1);
        assert!(run(&ThresholdCrossingDetector, &life(1, &[0.5, 0.7], &[])).is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_data() {
        let moments = run(&TrustSurgeDetector, &life(1, &[1.2, 1.5, f64::NAN, 3.0], &[]));
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].tick, 1);
    }
}
