//! Life-to-life detectors: karma inheritance and maturation
//!
//! Both compare a life with the one immediately before it and never fire for
//! the first life of a dataset.

use super::{
    DetectorKind, LifeContext, LifeDetector, MomentAccumulator, KARMA_EPSILON, MATURATION_DELTA,
};

/// A new life's initial trust differs from the previous life's final trust
pub struct KarmaInheritanceDetector;

impl LifeDetector for KarmaInheritanceDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::KarmaInheritance
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        if ctx.index == 0 {
            return acc;
        }
        let Some(prev) = ctx.prev else {
            return acc;
        };
        let (Some(prev_final), Some(initial)) = (prev.final_trust(), ctx.life.initial_trust())
        else {
            return acc;
        };

        let delta = initial - prev_final;
        if delta.abs() <= KARMA_EPSILON || delta.is_nan() {
            return acc;
        }

        let direction = if delta > 0.0 { "boost" } else { "penalty" };
        let moment = self
            .kind()
            .moment(ctx.simulation_id, ctx.life.life_number, 0)
            .tick(ctx.life.start_tick)
            .title(format!("Karma Carried Into Life {}", ctx.life.life_number))
            .narrative(format!(
                "Life {} began with trust {:.3} after life {} ended at {:.3}: a karma {} of {:+.3}.",
                ctx.life.life_number, initial, prev.life_number, prev_final, direction, delta
            ))
            .datum("prevFinalTrust", prev_final)
            .datum("initialTrust", initial)
            .datum("karmaDelta", delta)
            .datum("direction", direction)
            .build();
        acc.push(moment);
        acc
    }
}

/// A life ends with noticeably more trust than the previous life did.
///
/// Only final samples are compared; a life that peaks and declines again
/// is judged by where it ended.
pub struct MaturationDetector;

impl LifeDetector for MaturationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Maturation
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        if ctx.index == 0 {
            return acc;
        }
        let Some(prev) = ctx.prev else {
            return acc;
        };
        let (Some(prev_final), Some(curr_final)) = (prev.final_trust(), ctx.life.final_trust())
        else {
            return acc;
        };

        let improvement = curr_final - prev_final;
        if improvement.is_nan() || improvement <= MATURATION_DELTA {
            return acc;
        }

        let moment = self
            .kind()
            .moment(ctx.simulation_id, ctx.life.life_number, 0)
            .tick(ctx.life.end_tick)
            .title(format!("Maturation in Life {}", ctx.life.life_number))
            .narrative(format!(
                "Life {} ended with trust {:.3}, {:.3} higher than the {:.3} that life {} ended with.",
                ctx.life.life_number, curr_final, improvement, prev_final, prev.life_number
            ))
            .datum("prevFinalTrust", prev_final)
            .datum("finalTrust", curr_final)
            .datum("improvement", improvement)
            .build();
        acc.push(moment);
        acc
    }
}
