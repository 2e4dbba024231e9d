//! Ecosystem aggregation
//!
//! Folds every successfully normalized dataset and every detected moment into
//! one set of summary statistics. Callers pass only datasets that normalized;
//! a skipped dataset never shows up here as a zero-filled entry.

use crate::types::{Dataset, EcosystemStats, LifeRecord, Moment};

/// ATP spent over one life; a life that gains ATP overall spent nothing
pub fn atp_consumed(life: &LifeRecord) -> f64 {
    match (life.initial_atp(), life.final_atp()) {
        (Some(first), Some(last)) => {
            let spent = first - last;
            if spent.is_finite() {
                spent.max(0.0)
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Compute ecosystem-wide statistics
pub fn aggregate(datasets: &[Dataset], moments: &[Moment]) -> EcosystemStats {
    let mut stats = EcosystemStats {
        total_datasets: datasets.len(),
        ..Default::default()
    };

    // Trust is one flattened population, not a mean of per-life means
    let mut trust_sum = 0.0;
    let mut min_trust = f64::INFINITY;
    let mut max_trust = f64::NEG_INFINITY;

    for life in datasets.iter().flat_map(|d| d.lives.iter()) {
        stats.total_lives += 1;
        stats.total_atp_consumed += atp_consumed(life);
        *stats
            .lives_by_termination
            .entry(life.termination_reason)
            .or_insert(0) += 1;

        for &trust in life.trust_history.iter().filter(|t| t.is_finite()) {
            stats.trust_samples += 1;
            trust_sum += trust;
            min_trust = min_trust.min(trust);
            max_trust = max_trust.max(trust);
        }
    }

    if stats.trust_samples > 0 {
        stats.mean_trust = Some(trust_sum / stats.trust_samples as f64);
        stats.min_trust = Some(min_trust);
        stats.max_trust = Some(max_trust);
    }

    if !datasets.is_empty() {
        stats.mean_lives_per_dataset = Some(stats.total_lives as f64 / datasets.len() as f64);
    }

    for moment in moments {
        *stats.moments_by_category.entry(moment.category).or_insert(0) += 1;
        *stats.moments_by_severity.entry(moment.severity).or_insert(0) += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::life;
    use crate::detectors::DetectorCatalog;
    use crate::types::{MomentCategory, TerminationReason};
    use pretty_assertions::assert_eq;

    fn dataset(id: &str, lives: Vec<LifeRecord>) -> Dataset {
        Dataset {
            id: id.to_string(),
            label: id.to_uppercase(),
            narrative_id: None,
            lives,
        }
    }

    #[test]
    fn test_flattened_trust_population() {
        // Mean of means would be (0.2 + 0.7) / 2 = 0.45; the flat mean is 0.575
        let datasets = vec![
            dataset("a", vec![life(1, &[0.2], &[])]),
            dataset("b", vec![life(1, &[0.6, 0.7, 0.8], &[])]),
        ];
        let stats = aggregate(&datasets, &[]);

        assert_eq!(stats.total_datasets, 2);
        assert_eq!(stats.total_lives, 2);
        assert_eq!(stats.trust_samples, 4);
        assert!((stats.mean_trust.unwrap() - 0.575).abs() < 1e-12);
        assert_eq!(stats.min_trust, Some(0.2));
        assert_eq!(stats.max_trust, Some(0.8));
        assert_eq!(stats.mean_lives_per_dataset, Some(1.0));
    }

    #[test]
    fn test_atp_consumed_never_negative() {
        assert_eq!(atp_consumed(&life(1, &[], &[100.0, 40.0])), 60.0);
        assert_eq!(atp_consumed(&life(1, &[], &[40.0, 100.0])), 0.0);
        assert_eq!(atp_consumed(&life(1, &[], &[40.0])), 0.0);
        assert_eq!(atp_consumed(&life(1, &[], &[])), 0.0);

        let datasets = vec![dataset(
            "a",
            vec![
                life(1, &[], &[100.0, 40.0]),
                life(2, &[], &[40.0, 100.0]),
                life(3, &[], &[90.0, 80.0, 0.0]),
            ],
        )];
        assert_eq!(aggregate(&datasets, &[]).total_atp_consumed, 150.0);
    }

    #[test]
    fn test_moment_histograms() {
        let mut exhausted = life(2, &[0.3, 0.52], &[30.0, 0.0]);
        exhausted.termination_reason = TerminationReason::AtpExhaustion;
        let lives = vec![life(1, &[0.5, 0.3], &[]), exhausted];
        let moments = DetectorCatalog::new().detect_lives("a", &lives);

        let stats = aggregate(&[dataset("a", lives)], &moments);
        let total: usize = stats.moments_by_category.values().sum();
        assert_eq!(total, moments.len());
        assert_eq!(stats.moments_by_category[&MomentCategory::Trust], 2);
        assert_eq!(stats.moments_by_category[&MomentCategory::Crisis], 2);
        assert_eq!(
            stats.lives_by_termination[&TerminationReason::AtpExhaustion],
            1
        );
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[], &[]);
        assert_eq!(stats, EcosystemStats::default());
    }

    #[test]
    fn test_non_finite_samples_skipped() {
        let datasets = vec![dataset("a", vec![life(1, &[0.4, f64::NAN, 0.6], &[])])];
        let stats = aggregate(&datasets, &[]);
        assert_eq!(stats.trust_samples, 2);
        assert!((stats.mean_trust.unwrap() - 0.5).abs() < 1e-12);
    }
}
