// tests/fuzzy_tests.rs
// Output ranges and determinism of the fuzzy weight engine.

use proptest::prelude::*;
use rstest::rstest;

use vigil::fuzzy::{FuzzyEngine, FuzzyWeights};

fn in_ranges(w: &FuzzyWeights) -> bool {
    (0.0..=1.0).contains(&w.alpha) && (0.0..=10.0).contains(&w.beta) && (0.0..=1.0).contains(&w.gamma)
}

proptest! {
    #[test]
    fn weights_stay_in_output_ranges(distance in 0.0f64..6.0, angle in -120.0f64..120.0) {
        let weights = FuzzyEngine::default().infer(distance, angle);
        prop_assert!(in_ranges(&weights), "{:?}", weights);
    }

    #[test]
    fn inputs_beyond_universes_are_tolerated(distance in -100.0f64..2000.0, angle in -720.0f64..720.0) {
        let weights = FuzzyEngine::default().infer(distance, angle);
        prop_assert!(in_ranges(&weights), "{:?}", weights);
    }

    #[test]
    fn inference_is_deterministic(distance in 0.0f64..6.0, angle in -120.0f64..120.0) {
        let engine = FuzzyEngine::default();
        let first = engine.infer(distance, angle);
        // Unrelated call in between must not leak state
        engine.infer(5.0, 90.0);
        prop_assert_eq!(first, engine.infer(distance, angle));
    }
}

#[test]
fn near_frontal_obstacle_favours_clearance() {
    let w = FuzzyEngine::default().infer(2.0, 0.0);
    assert!(w.alpha < 0.4, "alpha {}", w.alpha);
    assert!(w.beta > 7.0, "beta {}", w.beta);
    assert!(w.gamma < 0.4, "gamma {}", w.gamma);
}

#[rstest]
#[case(1.0, -90.0)]
#[case(3.0, 75.0)]
#[case(5.0, -45.0)]
fn lateral_obstacle_favours_heading(#[case] distance: f64, #[case] angle: f64) {
    let w = FuzzyEngine::default().infer(distance, angle);
    assert!(w.alpha > 0.6, "alpha {}", w.alpha);
    assert!(w.beta < 5.0, "beta {}", w.beta);
}

#[test]
fn no_return_stand_in_matches_far_edge() {
    let engine = FuzzyEngine::default();
    assert_eq!(engine.infer(1000.0, 0.0), engine.infer(6.0, 0.0));
}
