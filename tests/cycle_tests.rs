// tests/cycle_tests.rs
// End-to-end decision cycles through the orchestrator.

use rstest::rstest;
use std::f64::consts::FRAC_PI_2;

use vigil::cbr::{Case, CaseStoreError, NewCase};
use vigil::core::{CommandReport, HoldReason};
use vigil::{
    AvoidanceCore, CaseLabel, CaseStore, CycleInput, CycleOutcome, KinematicState, MemoryCaseStore, Mode,
    RangeProfile, RetainStatus, Scenario, VigilConfig,
};

const BEAMS: usize = 180;
const DT: f64 = 0.17;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Profile with the given (index range, distance) patches and no return elsewhere
fn profile(patches: &[(std::ops::Range<usize>, f64)]) -> RangeProfile {
    let mut ranges = vec![f64::INFINITY; BEAMS];
    for (span, distance) in patches {
        for r in &mut ranges[span.clone()] {
            *r = *distance;
        }
    }
    RangeProfile::new(ranges, -FRAC_PI_2, FRAC_PI_2)
}

fn input(profile: RangeProfile, timestamp: f64) -> CycleInput {
    CycleInput {
        profile,
        state: KinematicState::at_rest(VigilConfig::default().vehicle).with_velocity(0.5, 0.0),
        goal_bearing_degrees: 0.0,
        timestamp,
        dt: DT,
    }
}

fn avoidance_core() -> AvoidanceCore<MemoryCaseStore> {
    init_logging();
    AvoidanceCore::new(VigilConfig::default(), MemoryCaseStore::new())
}

fn command(outcome: CycleOutcome) -> CommandReport {
    match outcome {
        CycleOutcome::Command(report) => *report,
        other => panic!("expected a command, got {:?}", other),
    }
}

#[test]
fn clear_path_stays_idle() {
    let mut core = avoidance_core();
    assert_eq!(core.run_cycle(&input(profile(&[]), 0.0)), CycleOutcome::Idle);
    assert_eq!(core.run_cycle(&input(profile(&[]), DT)), CycleOutcome::Idle);
    assert_eq!(core.mode(), Mode::Idle);
}

#[test]
fn isolated_obstacle_is_commanded_and_retained() {
    let mut core = avoidance_core();
    let ahead = || profile(&[(80..100, 2.0)]);

    // Seed cycle engages but has no scenario yet
    assert_eq!(core.run_cycle(&input(ahead(), 0.0)), CycleOutcome::Hold(HoldReason::NoScenario));
    assert_eq!(core.mode(), Mode::Avoiding);

    let report = command(core.run_cycle(&input(ahead(), DT)));
    assert_eq!(report.scenario, Scenario::IsolatedObstacle);
    assert_eq!(report.label, CaseLabel::NewCase);
    assert_eq!(report.retain, RetainStatus::Stored(1));
    assert_eq!(report.obstacle_distance, 2.0);
    assert!((report.obstacle_angle_deg + 10.0).abs() < 1e-9);
    assert!(report.weights.beta > 7.0);

    let stored = core.cbr().store().all_cases().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].linear_velocity, report.command.linear);
    assert_eq!(stored[0].angular_velocity, report.command.angular);
}

#[test]
fn commands_are_rate_limited_and_cases_reused() {
    let mut core = avoidance_core();
    let ahead = || profile(&[(80..100, 2.0)]);

    core.run_cycle(&input(ahead(), 0.0));
    let first = command(core.run_cycle(&input(ahead(), 0.17)));

    assert_eq!(core.run_cycle(&input(ahead(), 0.2)), CycleOutcome::Hold(HoldReason::RateLimited));

    let second = command(core.run_cycle(&input(ahead(), 0.4)));
    assert_eq!(second.label, CaseLabel::OldCase);
    assert_eq!(second.matched_case, Some(1));
    assert_eq!(second.retain, RetainStatus::Skipped);
    assert_eq!(second.command, first.command);
    assert_eq!(core.cbr().store().len(), 1);
}

/// Bands further apart than the clustering radius stay separate; closer ones chain into one cluster
#[rstest]
#[case(1.5, 2.5, Scenario::NarrowCorridor)]
#[case(2.0, 2.3, Scenario::NarrowCorridor)]
#[case(2.0, 2.05, Scenario::IsolatedObstacle)]
fn range_band_spacing_decides_corridor(#[case] near: f64, #[case] far: f64, #[case] expected: Scenario) {
    let mut core = avoidance_core();
    let bands = || profile(&[(70..85, near), (95..110, far)]);

    core.run_cycle(&input(bands(), 0.0));
    let report = command(core.run_cycle(&input(bands(), DT)));
    assert_eq!(report.scenario, expected);
    assert_eq!(report.obstacle_distance, near);
}

#[test]
fn approaching_cluster_is_a_moving_obstacle() {
    let mut core = avoidance_core();

    core.run_cycle(&input(profile(&[(80..100, 3.0)]), 0.0));
    let report = command(core.run_cycle(&input(profile(&[(80..100, 2.0)]), DT)));
    assert_eq!(report.scenario, Scenario::MovingObstacle);
}

#[test]
fn avoidance_is_released_after_debounce() {
    let mut core = avoidance_core();
    let ahead = || profile(&[(80..100, 2.0)]);

    core.run_cycle(&input(ahead(), 0.0));
    command(core.run_cycle(&input(ahead(), DT)));

    // Clear, but the last command is too recent
    assert_eq!(core.run_cycle(&input(profile(&[]), 0.25)), CycleOutcome::Hold(HoldReason::Clearing));
    assert_eq!(core.run_cycle(&input(profile(&[]), 0.5)), CycleOutcome::Released);
    assert_eq!(core.mode(), Mode::Idle);
    assert_eq!(core.run_cycle(&input(profile(&[]), 0.7)), CycleOutcome::Idle);
}

#[test]
fn side_obstacle_keeps_avoidance_alive() {
    let mut core = avoidance_core();
    core.run_cycle(&input(profile(&[(80..100, 2.0)]), 0.0));
    command(core.run_cycle(&input(profile(&[(80..100, 2.0)]), DT)));

    // Front clear, wide cone still inside its trigger distance
    let outcome = core.run_cycle(&input(profile(&[(10..30, 2.0)]), 1.0));
    assert!(matches!(outcome, CycleOutcome::Command(_)), "{:?}", outcome);
    assert_eq!(core.mode(), Mode::Avoiding);
}

#[test]
fn empty_profile_holds_while_avoiding() {
    let mut core = avoidance_core();
    core.run_cycle(&input(profile(&[(80..100, 2.0)]), 0.0));
    let empty = RangeProfile::new(Vec::new(), -FRAC_PI_2, FRAC_PI_2);
    assert_eq!(core.run_cycle(&input(empty, DT)), CycleOutcome::Hold(HoldReason::NoProfile));
}

/// Store whose writes always fail
struct ReadOnlyStore;

impl CaseStore for ReadOnlyStore {
    fn append(&mut self, _case: NewCase) -> Result<Case, CaseStoreError> {
        Err(CaseStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    fn all_cases(&self) -> Result<Vec<Case>, CaseStoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn retain_failure_does_not_block_the_command() {
    init_logging();
    let mut core = AvoidanceCore::new(VigilConfig::default(), ReadOnlyStore);
    let ahead = || profile(&[(80..100, 2.0)]);

    core.run_cycle(&input(ahead(), 0.0));
    let report = command(core.run_cycle(&input(ahead(), DT)));
    assert!(matches!(report.retain, RetainStatus::Failed(ref reason) if reason.contains("read-only")));
    assert!(report.command.linear <= VigilConfig::default().vehicle.max_v);
}
