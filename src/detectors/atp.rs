//! ATP detectors: crisis and death by exhaustion

use super::{DetectorKind, LifeContext, LifeDetector, MomentAccumulator, ATP_CRISIS_LEVEL};
use crate::types::{LifeState, TerminationReason};

/// ATP falls to the crisis level. At most one per life: the scan stops at the
/// first crossing, so a life that recovers and crashes again is reported once.
pub struct AtpCrisisDetector;

impl LifeDetector for AtpCrisisDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::AtpCrisis
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        if acc.has_fired(self.kind(), ctx.life.life_number) {
            return acc;
        }

        let crossing = ctx
            .life
            .atp_history
            .windows(2)
            .enumerate()
            .find(|(_, pair)| pair[0] > ATP_CRISIS_LEVEL && pair[1] <= ATP_CRISIS_LEVEL);

        let Some((i, pair)) = crossing else {
            return acc;
        };
        let (prev, curr) = (pair[0], pair[1]);
        let sample = i + 1;
        let tick = ctx.tick_at(sample);

        let moment = self
            .kind()
            .moment(ctx.simulation_id, ctx.life.life_number, sample)
            .tick(tick)
            .title(format!("ATP Crisis in Life {}", ctx.life.life_number))
            .narrative(format!(
                "ATP dropped from {:.1} to {:.1} at tick {}, falling to the crisis level of {:.0}.",
                prev, curr, tick, ATP_CRISIS_LEVEL
            ))
            .datum("prevAtp", prev)
            .datum("newAtp", curr)
            .datum("threshold", ATP_CRISIS_LEVEL)
            .build();
        acc.push(moment);
        acc.mark_fired(self.kind(), ctx.life.life_number);
        acc
    }
}

/// A life ended because its energy budget ran out
pub struct DeathByExhaustionDetector;

impl DeathByExhaustionDetector {
    fn exhausted(ctx: &LifeContext<'_>) -> bool {
        if ctx.life.termination_reason == TerminationReason::AtpExhaustion {
            return true;
        }
        ctx.life.life_state == Some(LifeState::Dead)
            && ctx.life.final_atp().is_some_and(|atp| atp <= 0.0)
    }
}

impl LifeDetector for DeathByExhaustionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::DeathByExhaustion
    }

    fn detect(&self, ctx: &LifeContext<'_>, mut acc: MomentAccumulator) -> MomentAccumulator {
        if !Self::exhausted(ctx) {
            return acc;
        }

        let life = ctx.life;
        let mut builder = self
            .kind()
            .moment(ctx.simulation_id, life.life_number, 0)
            .tick(life.end_tick)
            .title(format!("Death by Exhaustion in Life {}", life.life_number))
            .narrative(format!(
                "Life {} ended at tick {} after {} ticks when its ATP ran out.",
                life.life_number,
                life.end_tick,
                life.ticks_survived()
            ))
            .datum("ticksSurvived", life.ticks_survived())
            .datum("terminationReason", life.termination_reason.as_str());

        if let Some(atp) = life.final_atp() {
            builder = builder.datum("finalAtp", atp);
        }
        if let Some(trust) = life.final_trust() {
            builder = builder.datum("finalTrust", trust);
        }

        acc.push(builder.build());
        acc
    }
}
