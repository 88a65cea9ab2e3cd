// tests/navigation_tests.rs
// Dynamic-window planner behaviour over whole profiles.

use proptest::prelude::*;
use rstest::rstest;
use std::f64::consts::FRAC_PI_2;

use vigil::core::{ClassifierConfig, ClassifierSession, KinematicState, RangeProfile, Scenario, VehicleLimits};
use vigil::fuzzy::{FuzzyEngine, FuzzyWeights};
use vigil::navigation::planner::{DynamicWindow, is_stoppable};
use vigil::navigation::{DwaPlanner, NavigationConfig};

fn sample_range() -> impl Strategy<Value = f64> {
    prop_oneof![3 => 0.05f64..10.0, 1 => Just(f64::INFINITY)]
}

proptest! {
    #[test]
    fn selected_candidate_can_always_stop(
        ranges in prop::collection::vec(sample_range(), 1..200),
        v in 0.0f64..2.55,
        w in -3.0f64..3.0,
        goal in -180.0f64..180.0,
        alpha in 0.0f64..1.0,
        beta in 0.0f64..10.0,
        gamma in 0.0f64..1.0,
    ) {
        let limits = VehicleLimits::default();
        let state = KinematicState::at_rest(limits).with_velocity(v, w);
        let profile = RangeProfile::new(ranges, -FRAC_PI_2, FRAC_PI_2);
        let weights = FuzzyWeights { alpha, beta, gamma };
        let dt = 0.17;

        let plan = DwaPlanner::new(NavigationConfig::default()).plan(&state, &profile, goal, dt, &weights);

        match plan.cost {
            None => prop_assert_eq!((plan.v, plan.w), (0.0, 0.0)),
            Some(_) => {
                let index = profile.index_of_bearing(plan.w * dt).unwrap();
                let clearance = profile.distance_at(index);
                prop_assert!(clearance.is_infinite() || is_stoppable(&limits, clearance, plan.v, plan.w));
                prop_assert!(plan.v <= limits.max_v && plan.w.abs() <= limits.max_w);
            }
        }
    }

    #[test]
    fn window_stays_inside_limits(v in 0.0f64..2.55, w in -3.0f64..3.0, dt in 0.01f64..1.0) {
        let limits = VehicleLimits::default();
        let state = KinematicState::at_rest(limits).with_velocity(v, w);
        let window = DynamicWindow::compute(&state, dt);
        prop_assert!(window.min_v >= limits.min_v && window.max_v <= limits.max_v);
        prop_assert!(window.min_w >= -limits.max_w && window.max_w <= limits.max_w);
        prop_assert!(window.min_v <= window.max_v && window.min_w <= window.max_w);
    }
}

#[rstest]
#[case(12, 12, 144)]
#[case(5, 3, 15)]
#[case(1, 1, 1)]
fn grid_size_follows_resolution(#[case] v_res: usize, #[case] w_res: usize, #[case] expected: usize) {
    let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(1.0, 0.0);
    let window = DynamicWindow::compute(&state, 0.17);
    let grid = window.candidates(v_res, w_res);
    assert_eq!(grid.len(), expected);
    assert_eq!(grid[0], (window.min_v, window.min_w));
}

#[test]
fn clearance_weight_steers_away_from_blocked_front() {
    // Wall at 2 m on the left half and straight ahead, open on the right
    let ranges: Vec<f64> = (0..180).map(|i| if i < 92 { 2.0 } else { f64::INFINITY }).collect();
    let profile = RangeProfile::new(ranges, -FRAC_PI_2, FRAC_PI_2);
    let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(0.5, 0.0);
    let weights = FuzzyWeights { alpha: 0.2, beta: 9.0, gamma: 0.1 };

    let plan = DwaPlanner::new(NavigationConfig::default()).plan(&state, &profile, 0.0, 0.17, &weights);
    assert!(plan.w > 0.0, "expected a turn toward the open side, got w={}", plan.w);
}

#[test]
fn frontal_cluster_prefers_gentle_turn() {
    // Flat cluster at 2 m straight ahead, open to both sides
    let ranges: Vec<f64> = (0..180).map(|i| if (80..100).contains(&i) { 2.0 } else { f64::INFINITY }).collect();
    let profile = RangeProfile::new(ranges, -FRAC_PI_2, FRAC_PI_2);
    let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(0.5, 0.0);
    let dt = 0.17;

    let mut classifier = ClassifierSession::new(ClassifierConfig::default());
    assert_eq!(classifier.classify(&profile, state.v, 0.0), None);
    assert_eq!(classifier.classify(&profile, state.v, dt), Some(Scenario::IsolatedObstacle));

    let weights = FuzzyEngine::default().infer(2.0, 0.0);
    assert!(weights.beta > 7.0 && weights.alpha < 0.4 && weights.gamma < 0.4, "{:?}", weights);

    let config = NavigationConfig::default();
    let plan = DwaPlanner::new(config).plan(&state, &profile, 0.0, dt, &weights);
    assert!(plan.cost.is_some());
    assert_eq!(plan.rejected, 0);

    let window = DynamicWindow::compute(&state, dt);
    let gentlest = window
        .candidates(config.v_resolution, config.w_resolution)
        .iter()
        .map(|&(_, w)| w.abs())
        .fold(f64::INFINITY, f64::min);
    assert!((plan.w.abs() - gentlest).abs() < 1e-9, "w={} gentlest={}", plan.w, gentlest);
    assert!(plan.w.abs() < window.max_w);
}
