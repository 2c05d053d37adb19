use irismatch::{
    Comparator, ComparatorConfig, Compare, CorrelationConfig, KeypointConfig, NormalizedTemplate,
    PhaseCodeConfig,
};
use rand::{Rng, SeedableRng};

fn random_template(seed: u64) -> NormalizedTemplate {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let data: Vec<u8> = (0..NormalizedTemplate::SAMPLES)
        .map(|_| rng.random::<u8>())
        .collect();
    NormalizedTemplate::from_bytes(data).unwrap()
}

/// A compact phase-code configuration so the 2-D filtering stays fast in
/// tests; scoring properties are extent-independent.
fn small_phase_config() -> PhaseCodeConfig {
    PhaseCodeConfig {
        sigma: 2.0,
        ..PhaseCodeConfig::default()
    }
}

fn all_strategies() -> Vec<ComparatorConfig> {
    vec![
        ComparatorConfig::PhaseCode(small_phase_config()),
        ComparatorConfig::Correlation(CorrelationConfig::default()),
        ComparatorConfig::Keypoint(KeypointConfig::default()),
    ]
}

#[test]
fn authorize_is_equivalent_to_threshold_comparison() {
    let probe = random_template(11);
    let template = random_template(42);

    for config in all_strategies() {
        let comparator = Comparator::new(config);
        for other in [&probe, &template] {
            let score = comparator.compare(&probe, other);
            assert_eq!(
                comparator.authorize(&probe, other),
                score < comparator.threshold(),
                "authorize must mirror compare < threshold (score {score})"
            );
        }
    }
}

#[test]
fn phase_code_score_stays_in_unit_interval() {
    let comparator = Comparator::new(ComparatorConfig::PhaseCode(small_phase_config()));
    for seed in [1u64, 7, 99] {
        let a = random_template(seed);
        let b = random_template(seed + 1000);
        let score = comparator.compare(&a, &b);
        assert!((-1.0..=0.0).contains(&score), "got {score}");
    }
}

#[test]
fn phase_code_self_comparison_is_extreme() {
    let comparator = Comparator::new(ComparatorConfig::PhaseCode(small_phase_config()));
    let template = random_template(5);
    let score = comparator.compare(&template, &template);
    assert!((score + 1.0).abs() < 1e-12, "got {score}");
}

#[test]
fn self_comparison_is_never_worse_than_cross_comparison() {
    let a = random_template(3);
    let b = random_template(4);

    for config in [
        ComparatorConfig::PhaseCode(small_phase_config()),
        ComparatorConfig::Correlation(CorrelationConfig::default()),
    ] {
        let comparator = Comparator::new(config);
        let self_score = comparator.compare(&a, &a);
        let cross_score = comparator.compare(&a, &b);
        assert!(
            self_score <= cross_score,
            "self {self_score} vs cross {cross_score}"
        );
    }
}

#[test]
fn strategy_thresholds_are_owned_per_instance() {
    let strict = Comparator::new(ComparatorConfig::Correlation(CorrelationConfig {
        threshold: 1e-9,
    }));
    let lax = Comparator::new(ComparatorConfig::Correlation(CorrelationConfig {
        threshold: 10.0,
    }));

    let probe = random_template(8);
    let near = random_template(9);
    assert!(!strict.authorize(&probe, &near));
    assert!(lax.authorize(&probe, &near));
}
