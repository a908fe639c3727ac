//! Property tests for scoring and simulation.

use proptest::prelude::*;
use worldpam_lib::config::loader::parse_config;
use worldpam_lib::config::NoiseKind;
use worldpam_lib::corpus::Corpus;
use worldpam_lib::signals::sampling::{MonteCarlo, NoiseModel};
use worldpam_lib::signals::{score, Evidence};
use worldpam_lib::{AssessOptions, Assessor, Model};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn model(prior: f64, w_up: f64, w_down: f64) -> Model {
    let json = format!(
        r#"{{
            "keyword_sets": {{ "unrest": ["riot", "protest", "clashes"] }},
            "signals": [
                {{ "name": "up", "weight": {} }},
                {{ "name": "down", "weight": {} }},
                {{ "name": "unrest", "weight": 1.5, "keyword_sets": ["unrest"] }}
            ],
            "hypotheses": [
                {{ "name": "h", "prior": {}, "signals": ["up", "down"] }},
                {{ "name": "unrest_risk", "prior": 0.1, "signals": ["unrest"] }}
            ]
        }}"#,
        w_up, -w_down, prior
    );
    Model::resolve(&parse_config(&json).unwrap()).unwrap()
}

fn arb_prior() -> impl Strategy<Value = f64> {
    0.001f64..0.999
}

fn arb_weight() -> impl Strategy<Value = f64> {
    0.0f64..20.0
}

/// Priors and weights that keep the logit well inside the range where the
/// sigmoid still resolves small evidence changes.
fn arb_interior_prior() -> impl Strategy<Value = f64> {
    0.01f64..0.99
}

fn arb_nonzero_weight() -> impl Strategy<Value = f64> {
    0.5f64..5.0
}

fn arb_noise() -> impl Strategy<Value = NoiseKind> {
    prop_oneof![
        Just(NoiseKind::Uniform),
        Just(NoiseKind::Normal),
        Just(NoiseKind::Bernoulli),
    ]
}

fn probability(model: &Model, up: f64, down: f64) -> f64 {
    let h = model.hypothesis_by_name("h").unwrap();
    let evidence = Evidence::from_named(model, [("up", up), ("down", down)]).unwrap();
    score(model, h, &evidence).unwrap().probability
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn probability_in_unit_interval(
        prior in arb_prior(),
        w_up in arb_weight(),
        w_down in arb_weight(),
        up in -1.0f64..2.0,
        down in -1.0f64..2.0,
    ) {
        let model = model(prior, w_up, w_down);
        let p = probability(&model, up, down);
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn positive_weight_is_strictly_increasing(
        prior in arb_interior_prior(),
        w_up in arb_nonzero_weight(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        down in 0.0f64..=1.0,
    ) {
        let model = model(prior, w_up, 1.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assume!(hi - lo > 1e-6);
        prop_assert!(probability(&model, lo, down) < probability(&model, hi, down));
    }

    #[test]
    fn negative_weight_is_strictly_decreasing(
        prior in arb_interior_prior(),
        w_down in arb_nonzero_weight(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        up in 0.0f64..=1.0,
    ) {
        let model = model(prior, 1.0, w_down);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assume!(hi - lo > 1e-6);
        prop_assert!(probability(&model, up, lo) > probability(&model, up, hi));
    }

    #[test]
    fn zero_weight_ignores_evidence(
        prior in arb_prior(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        down in 0.0f64..=1.0,
    ) {
        let model = model(prior, 0.0, 0.0);
        prop_assert_eq!(probability(&model, a, down), probability(&model, b, down));
        prop_assert!((probability(&model, a, down) - prior).abs() < 1e-9);
    }

    #[test]
    fn zero_evidence_returns_prior(prior in arb_prior(), w in arb_weight()) {
        let model = model(prior, w, w);
        prop_assert!((probability(&model, 0.0, 0.0) - prior).abs() < 1e-9);
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn simulation_brackets_mean_and_reproduces(
        prior in arb_prior(),
        up in 0.0f64..=1.0,
        down in 0.0f64..=1.0,
        kind in arb_noise(),
        spread in 0.0f64..0.5,
        weight_spread in 0.0f64..0.5,
        trials in 1i64..300,
        seed in any::<u64>(),
    ) {
        let model = model(prior, 3.0, 2.0);
        let h = model.hypothesis_by_name("h").unwrap();
        let evidence = Evidence::from_named(&model, [("up", up), ("down", down)]).unwrap();
        let noise = NoiseModel::new(kind, spread, weight_spread).unwrap();
        let mc = MonteCarlo::new(noise, seed);

        let first = mc.simulate(&model, h, &evidence, trials).unwrap().unwrap();
        let second = mc.simulate(&model, h, &evidence, trials).unwrap().unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.trial_count, trials as u64);
        prop_assert!(first.p05 <= first.mean && first.mean <= first.p95);
        prop_assert!(first.p05 >= 0.0 && first.p95 <= 1.0);
    }

    #[test]
    fn fixed_noise_collapses_to_point_estimate(
        prior in arb_prior(),
        up in 0.0f64..=1.0,
        down in 0.0f64..=1.0,
        trials in 1i64..50,
    ) {
        let model = model(prior, 3.0, 2.0);
        let h = model.hypothesis_by_name("h").unwrap();
        let evidence = Evidence::from_named(&model, [("up", up), ("down", down)]).unwrap();
        let point = score(&model, h, &evidence).unwrap().probability;
        let sim = MonteCarlo::new(NoiseModel::fixed(), 1)
            .simulate(&model, h, &evidence, trials)
            .unwrap()
            .unwrap();
        prop_assert!((sim.mean - point).abs() < 1e-12);
        prop_assert!((sim.p05 - point).abs() < 1e-12);
        prop_assert!((sim.p95 - point).abs() < 1e-12);
    }
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn more_keyword_hits_never_lower_the_score(extra in 0usize..30, filler in "[a-z ]{0,40}") {
        let model = model(0.2, 1.0, 1.0);
        let assessor = Assessor::with_noise(&model, NoiseModel::fixed());
        let options = AssessOptions::default();

        let base: Corpus = vec![format!("riot {}", filler)].into_iter().collect();
        let more: Corpus = vec![format!("riot {} {}", filler, "protest ".repeat(extra))]
            .into_iter()
            .collect();

        let before = assessor.assess("unrest_risk", &base, &options).unwrap();
        let after = assessor.assess("unrest_risk", &more, &options).unwrap();
        prop_assert!(after.score.probability >= before.score.probability);
    }
}
