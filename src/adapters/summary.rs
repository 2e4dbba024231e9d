//! Single-life summary adapter
//!
//! Summary-only exports carry initial and final values but no intermediate
//! ticks, so the life is synthesized with a 2-point `[initial, final]` history.

use crate::error::EngineError;
use crate::types::{LifeRecord, Sampling, TerminationReason};
use serde::Deserialize;
use serde_json::Value;

use super::{required, NormalizedSource, SchemaAdapter};

/// Adapter for `{ life_summary: {...} }`
#[derive(Debug, Clone, Copy, Default)]
pub struct LifeSummaryAdapter;

impl SchemaAdapter for LifeSummaryAdapter {
    fn parse(&self, raw: &Value) -> Result<NormalizedSource, EngineError> {
        let summary = required(raw, "life_summary")?;
        if !summary.is_object() {
            return Err(EngineError::Parse(
                "`life_summary` is not an object".to_string(),
            ));
        }
        let summary = RawLifeSummary::deserialize(summary)?;

        let record = LifeRecord {
            life_number: 1,
            start_tick: 0,
            end_tick: summary.ticks_survived.unwrap_or(0),
            trust_history: endpoints(summary.initial_trust, summary.final_trust),
            atp_history: endpoints(summary.initial_atp, summary.final_atp),
            termination_reason: summary.termination_reason.unwrap_or_default(),
            life_state: None,
            sampling: Sampling::Endpoints,
        };

        Ok(NormalizedSource::Lives(vec![record]))
    }
}

/// Missing endpoints are left out rather than invented
fn endpoints(initial: Option<f64>, last: Option<f64>) -> Vec<f64> {
    initial.into_iter().chain(last).collect()
}

#[derive(Debug, Deserialize)]
struct RawLifeSummary {
    #[serde(default)]
    initial_trust: Option<f64>,
    #[serde(default)]
    final_trust: Option<f64>,
    #[serde(default)]
    initial_atp: Option<f64>,
    #[serde(default)]
    final_atp: Option<f64>,
    #[serde(default)]
    ticks_survived: Option<u64>,
    #[serde(default)]
    termination_reason: Option<TerminationReason>,
}
