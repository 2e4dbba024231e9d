//! Multi-life adapter
//!
//! Parses exports carrying a `lives` array, either at the top level or nested
//! one level under a named key (policy exports).

use crate::error::EngineError;
use crate::types::{LifeRecord, LifeState, Sampling, TerminationReason};
use serde::Deserialize;
use serde_json::Value;

use super::{required, NormalizedSource, SchemaAdapter};

/// Adapter for `{ lives: [...] }` and `{ <key>: { lives: [...] } }`
#[derive(Debug, Clone, Default)]
pub struct MultiLifeAdapter {
    nested_key: Option<String>,
}

impl MultiLifeAdapter {
    pub fn top_level() -> Self {
        Self { nested_key: None }
    }

    pub fn nested(key: &str) -> Self {
        Self {
            nested_key: Some(key.to_string()),
        }
    }
}

impl SchemaAdapter for MultiLifeAdapter {
    fn parse(&self, raw: &Value) -> Result<NormalizedSource, EngineError> {
        let container = match &self.nested_key {
            Some(key) => required(raw, key)?,
            None => raw,
        };

        let lives = required(container, "lives")?;
        if !lives.is_array() {
            return Err(EngineError::Parse("`lives` is not an array".to_string()));
        }

        let raw_lives = Vec::<RawLife>::deserialize(lives)?;
        Ok(NormalizedSource::Lives(convert_lives(raw_lives)))
    }
}

/// Lives are sequential: a life without its own start tick begins where the
/// previous one ended.
fn convert_lives(raw_lives: Vec<RawLife>) -> Vec<LifeRecord> {
    let mut records = Vec::with_capacity(raw_lives.len());
    let mut previous_end = 0u64;

    for (index, life) in raw_lives.into_iter().enumerate() {
        let trust_history = life.trust_history.unwrap_or_default();
        let atp_history = life.atp_history.unwrap_or_default();

        let start_tick = life.start_tick.unwrap_or(previous_end);
        let samples = trust_history.len().max(atp_history.len()) as u64;
        let end_tick = life
            .end_tick
            .unwrap_or_else(|| start_tick.saturating_add(samples.saturating_sub(1)))
            .max(start_tick);

        records.push(LifeRecord {
            life_number: index as u32 + 1,
            start_tick,
            end_tick,
            trust_history,
            atp_history,
            termination_reason: life.termination_reason.unwrap_or_default(),
            life_state: life.life_state.as_deref().and_then(parse_life_state),
            sampling: Sampling::PerTick,
        });

        previous_end = end_tick;
    }

    records
}

fn parse_life_state(state: &str) -> Option<LifeState> {
    match state.to_ascii_lowercase().as_str() {
        "alive" => Some(LifeState::Alive),
        "dead" => Some(LifeState::Dead),
        _ => None,
    }
}

// Raw export structures

#[derive(Debug, Deserialize)]
struct RawLife {
    #[serde(default, alias = "t3_history")]
    trust_history: Option<Vec<f64>>,
    #[serde(default)]
    atp_history: Option<Vec<f64>>,
    #[serde(default)]
    start_tick: Option<u64>,
    #[serde(default)]
    end_tick: Option<u64>,
    #[serde(default)]
    termination_reason: Option<TerminationReason>,
    #[serde(default)]
    life_state: Option<String>,
}
