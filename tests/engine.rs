use moment_engine::loader::FetchedDataset;
use moment_engine::ranking::score;
use moment_engine::{
    DatasetDescriptor, DatasetRegistry, MomentCategory, MomentEngine, SchemaKind, Severity,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn multi_life() -> Value {
    json!({
        "lives": [
            { "t3_history": [0.42, 0.48, 0.55, 0.61], "atp_history": [100.0, 70.0, 40.0, 18.0],
              "start_tick": 0, "end_tick": 3, "termination_reason": "natural" },
            { "t3_history": [0.58, 0.44, 0.52, 0.7], "atp_history": [100.0, 60.0, 10.0, 0.0],
              "termination_reason": "atp_exhaustion" },
            { "t3_history": [0.68, 0.5], "atp_history": [90.0, 85.0] }
        ]
    })
}

fn policy() -> Value {
    json!({ "results": { "lives": [
        { "trust_history": [0.3, 0.2, 0.25], "atp_history": [50.0, 45.0, 40.0] },
        { "trust_history": [0.35, 0.6] }
    ] } })
}

fn summary() -> Value {
    json!({ "life_summary": {
        "initial_trust": 0.45, "final_trust": 0.2,
        "initial_atp": 100.0, "final_atp": 0.0,
        "ticks_survived": 240, "termination_reason": "atp_exhaustion"
    } })
}

fn network() -> Value {
    json!({
        "num_agents": 6,
        "num_ticks": 100,
        "events": [
            { "tick": 4, "type": "trust_update" },
            { "tick": 30, "type": "coalition_formed", "agents": ["a", "b", "c"] }
        ],
        "snapshots": [
            { "tick": 0, "avg_trust": 0.5, "num_edges": 0, "num_coalitions": 0, "num_alive": 6 },
            { "tick": 100, "avg_trust": 0.64, "num_edges": 9, "num_coalitions": 2, "num_alive": 5 }
        ]
    })
}

fn descriptors() -> Vec<DatasetDescriptor> {
    vec![
        DatasetDescriptor::new("karma", "karma.json", "Karma run", SchemaKind::MultiLife)
            .with_narrative("karma-arc"),
        DatasetDescriptor::new(
            "policy",
            "policy.json",
            "Policy run",
            SchemaKind::NestedMultiLife {
                key: "results".to_string(),
            },
        ),
        DatasetDescriptor::new("summary", "summary.json", "Summary", SchemaKind::LifeSummary),
        DatasetDescriptor::new("network", "network.json", "Network", SchemaKind::NetworkLog),
    ]
}

fn fetched(with_malformed: bool) -> Vec<FetchedDataset> {
    let payloads = [multi_life(), policy(), summary(), network()];
    let mut out: Vec<FetchedDataset> = descriptors()
        .into_iter()
        .zip(payloads)
        .map(|(d, raw)| FetchedDataset::new(d, Some(raw)))
        .collect();
    if with_malformed {
        out.insert(
            1,
            FetchedDataset::new(
                DatasetDescriptor::new("bad", "bad.json", "Bad", SchemaKind::MultiLife),
                Some(json!({ "lives": "not a list" })),
            ),
        );
    }
    out
}

#[test]
fn ranked_moments_are_deterministic() {
    let engine = MomentEngine::new().with_instance_id("fixed");
    let first = engine.analyze(&fetched(false));
    let second = engine.analyze(&fetched(false));

    let json_a = serde_json::to_string(&first.moments).unwrap();
    let json_b = serde_json::to_string(&second.moments).unwrap();
    assert_eq!(json_a, json_b);
    assert!(!first.moments.is_empty());
}

#[test]
fn ranking_is_descending_and_scores_are_bounded() {
    const SCORES: [f64; 11] = [6.0, 4.5, 3.0, 2.4, 1.5, 4.0, 2.0, 1.6, 1.0, 0.8, 0.5];

    let report = MomentEngine::new().analyze(&fetched(false));
    let scores: Vec<f64> = report.moments.iter().map(score).collect();

    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "not descending: {:?}", scores);
    }
    for s in &scores {
        assert!(
            SCORES.iter().any(|k| (k - s).abs() < 1e-12),
            "unexpected score {}",
            s
        );
    }
}

#[test]
fn malformed_dataset_is_excluded_from_aggregates() {
    let engine = MomentEngine::new();
    let clean = engine.analyze(&fetched(false));
    let dirty = engine.analyze(&fetched(true));

    assert_eq!(dirty.skipped, vec!["bad".to_string()]);
    assert_eq!(clean.stats, dirty.stats);
    assert_eq!(clean.moments.len(), dirty.moments.len());
}

#[test]
fn every_schema_contributes() {
    let report = MomentEngine::new().analyze(&fetched(false));
    let stats = &report.stats;

    // karma 3 lives + policy 2 + summary 1; the network log holds no lives
    assert_eq!(stats.total_datasets, 3);
    assert_eq!(stats.total_lives, 6);
    assert_eq!(stats.trust_samples, 4 + 4 + 2 + 3 + 2 + 2);

    for id in ["karma", "policy", "summary", "network"] {
        assert!(
            report.moments.iter().any(|m| m.simulation_id == id),
            "no moments for {}",
            id
        );
    }

    let network: Vec<_> = report
        .moments
        .iter()
        .filter(|m| m.simulation_id == "network")
        .collect();
    assert_eq!(network.len(), 2);
    assert!(network.iter().all(|m| m.category == MomentCategory::Emergence));
    assert!(network.iter().any(|m| m.tick == 30 && m.severity == Severity::Critical));
}

#[test]
fn death_by_exhaustion_from_summary() {
    let report = MomentEngine::new().analyze(&fetched(false));
    let death = report
        .moments
        .iter()
        .find(|m| m.simulation_id == "summary" && m.category == MomentCategory::Crisis)
        .expect("summary life ended in exhaustion");
    assert_eq!(death.tick, 240);
    assert_eq!(death.life_number, 1);
}

#[tokio::test]
async fn run_reads_registry_from_disk() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("karma.json"), multi_life().to_string()).unwrap();
    fs::write(dir.path().join("policy.json"), policy().to_string()).unwrap();
    fs::write(dir.path().join("summary.json"), "{ truncated").unwrap();
    // network.json is never written

    let registry = DatasetRegistry::new(descriptors());
    let report = MomentEngine::new().run(&registry, dir.path()).await;

    assert_eq!(report.skipped, vec!["summary".to_string(), "network".to_string()]);
    assert_eq!(report.stats.total_datasets, 2);
    assert_eq!(report.stats.total_lives, 5);
}

#[tokio::test]
async fn total_failure_degrades_to_empty_report() {
    let dir = TempDir::new().unwrap();
    let registry = DatasetRegistry::new(descriptors());
    let report = MomentEngine::new().run(&registry, dir.path()).await;

    assert!(report.moments.is_empty());
    assert_eq!(report.skipped.len(), 4);
    assert_eq!(report.stats.total_lives, 0);
    assert_eq!(report.stats.mean_trust, None);
}
