//! Network detectors: coalition formation and overall network evolution
//!
//! Network moments are dataset-wide and carry life number 0.

use super::{DetectorKind, MomentAccumulator, NetworkDetector};
use crate::types::{NetworkLog, NetworkSnapshot};

/// Event type that marks a coalition forming
pub const COALITION_FORMED: &str = "coalition_formed";

const DATASET_SCOPE: u32 = 0;

/// The first coalition to form in a network run
pub struct CoalitionFormationDetector;

impl NetworkDetector for CoalitionFormationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::CoalitionFormation
    }

    fn detect(
        &self,
        simulation_id: &str,
        log: &NetworkLog,
        mut acc: MomentAccumulator,
    ) -> MomentAccumulator {
        if acc.has_fired(self.kind(), DATASET_SCOPE) {
            return acc;
        }
        let Some((index, event)) = log
            .events
            .iter()
            .enumerate()
            .find(|(_, e)| e.kind == COALITION_FORMED)
        else {
            return acc;
        };

        let narrative = if event.agents.is_empty() {
            format!(
                "The first coalition formed at tick {} in a network of {} agents.",
                event.tick, log.num_agents
            )
        } else {
            format!(
                "The first coalition formed at tick {}: {} of {} agents joined together.",
                event.tick,
                event.agents.len(),
                log.num_agents
            )
        };

        let moment = self
            .kind()
            .moment(simulation_id, DATASET_SCOPE, index)
            .tick(event.tick)
            .title("Coalition Formed".to_string())
            .narrative(narrative)
            .datum("coalitionSize", event.agents.len() as u64)
            .datum("numAgents", log.num_agents as u64)
            .datum("eventIndex", index as u64)
            .build();
        acc.push(moment);
        acc.mark_fired(self.kind(), DATASET_SCOPE);
        acc
    }
}

/// First-to-last snapshot summary, once per network with at least two snapshots
pub struct NetworkEvolutionDetector;

impl NetworkEvolutionDetector {
    fn describe(first: &NetworkSnapshot, last: &NetworkSnapshot) -> Vec<String> {
        let mut parts = Vec::new();
        if let (Some(a), Some(b)) = (first.avg_trust, last.avg_trust) {
            parts.push(format!("average trust moved from {:.3} to {:.3}", a, b));
        }
        if let (Some(a), Some(b)) = (first.num_edges, last.num_edges) {
            parts.push(format!("trust relationships went from {:.0} to {:.0}", a, b));
        }
        if let Some(c) = last.num_coalitions {
            parts.push(format!("{:.0} coalitions were active at the end", c));
        }
        if let (Some(a), Some(b)) = (first.num_alive, last.num_alive) {
            parts.push(format!("living agents went from {:.0} to {:.0}", a, b));
        }
        parts
    }
}

impl NetworkDetector for NetworkEvolutionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::NetworkEvolution
    }

    fn detect(
        &self,
        simulation_id: &str,
        log: &NetworkLog,
        mut acc: MomentAccumulator,
    ) -> MomentAccumulator {
        if log.snapshots.len() < 2 {
            return acc;
        }
        let (Some(first), Some(last)) = (log.snapshots.first(), log.snapshots.last()) else {
            return acc;
        };

        let parts = Self::describe(first, last);
        let detail = if parts.is_empty() {
            "the network was observed without aggregate metrics".to_string()
        } else {
            parts.join("; ")
        };

        let mut builder = self
            .kind()
            .moment(simulation_id, DATASET_SCOPE, 0)
            .tick(last.tick)
            .title("Network Evolution".to_string())
            .narrative(format!(
                "Across {} snapshots from tick {} to tick {}, {}.",
                log.snapshots.len(),
                first.tick,
                last.tick,
                detail
            ))
            .datum("snapshotCount", log.snapshots.len() as u64)
            .datum("firstTick", first.tick)
            .datum("lastTick", last.tick)
            .datum("numAgents", log.num_agents as u64);

        if let (Some(a), Some(b)) = (first.avg_trust, last.avg_trust) {
            builder = builder.datum("initialTrust", a).datum("finalTrust", b);
        }
        if let (Some(a), Some(b)) = (first.num_edges, last.num_edges) {
            builder = builder.datum("initialEdges", a).datum("finalEdges", b);
        }

        acc.push(builder.build());
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::DetectorCatalog;
    use crate::types::{MomentCategory, NetworkEvent, Severity};
    use serde_json::json;

    fn snapshot(tick: u64, trust: f64, edges: f64) -> NetworkSnapshot {
        NetworkSnapshot {
            tick,
            avg_trust: Some(trust),
            num_edges: Some(edges),
            ..Default::default()
        }
    }

    fn event(tick: u64, kind: &str, agents: usize) -> NetworkEvent {
        NetworkEvent {
            tick,
            kind: kind.to_string(),
            agents: (0..agents).map(|i| json!(format!("agent-{i}"))).collect(),
        }
    }

    #[test]
    fn test_first_coalition_only() {
        let log = NetworkLog {
            num_agents: 10,
            num_ticks: 100,
            events: vec![
                event(3, "trust_update", 0),
                event(12, COALITION_FORMED, 4),
                event(40, COALITION_FORMED, 6),
            ],
            snapshots: vec![],
        };

        let moments = DetectorCatalog::new().detect_network("net", &log);
        assert_eq!(moments.len(), 1);
        let m = &moments[0];
        assert_eq!(m.id, "net-coalition-life0-1");
        assert_eq!(m.tick, 12);
        assert_eq!(m.life_number, 0);
        assert_eq!(m.category, MomentCategory::Emergence);
        assert_eq!(m.severity, Severity::Critical);
        assert_eq!(m.data["coalitionSize"].as_f64(), Some(4.0));
    }

    #[test]
    fn test_network_evolution_needs_two_snapshots() {
        let mut log = NetworkLog {
            num_agents: 5,
            num_ticks: 50,
            events: vec![],
            snapshots: vec![snapshot(0, 0.5, 2.0)],
        };
        assert!(DetectorCatalog::new().detect_network("net", &log).is_empty());

        log.snapshots.push(snapshot(25, 0.55, 6.0));
        log.snapshots.push(snapshot(50, 0.61, 9.0));
        let moments = DetectorCatalog::new().detect_network("net", &log);
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].severity, Severity::High);
        assert_eq!(moments[0].tick, 50);
        assert_eq!(
            moments[0].narrative,
            "Across 3 snapshots from tick 0 to tick 50, average trust moved from 0.500 to 0.610; trust relationships went from 2 to 9."
        );
    }

    #[test]
    fn test_network_evolution_without_metrics() {
        let log = NetworkLog {
            snapshots: vec![NetworkSnapshot::default(), NetworkSnapshot::default()],
            ..Default::default()
        };
        let moments = DetectorCatalog::new().detect_network("net", &log);
        assert!(moments[0].narrative.contains("without aggregate metrics"));
    }
}
