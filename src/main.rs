// src/main.rs
// Replay driver for Vigil: drives a simulated vehicle toward a single round
// obstacle, feeds every cycle through the decision core and integrates the
// commands it emits.
//
// Usage: vigil [config.yaml]

use log::{error, info, warn};
use nalgebra::{Point2, UnitComplex, Vector2};
use std::error::Error;
use std::f64::consts::FRAC_PI_2;

use vigil::{
    AvoidanceCore, CaseStore, CycleInput, CycleOutcome, KinematicState, RangeProfile, RetainStatus, VigilConfig,
    YamlCaseStore,
};

const BEAMS: usize = 180;
const MAX_RANGE: f64 = 12.0;
const CYCLES: usize = 240;

/// Round obstacle in the odometry frame
struct Obstacle {
    center: Point2<f64>,
    radius: f64,
}

impl Obstacle {
    /// Range along a ray, `None` when it misses
    fn range_along(&self, origin: &Point2<f64>, direction: &Vector2<f64>) -> Option<f64> {
        let to_center = self.center - *origin;
        let along = to_center.dot(direction);
        let miss_sq = to_center.norm_squared() - along * along;
        let radius_sq = self.radius * self.radius;
        if along <= 0.0 || miss_sq > radius_sq {
            return None;
        }
        Some(along - (radius_sq - miss_sq).sqrt())
    }
}

/// Simulated scan with `BEAMS` samples over the forward half plane
fn scan(state: &KinematicState, obstacle: &Obstacle) -> RangeProfile {
    let increment = (2.0 * FRAC_PI_2) / BEAMS as f64;
    let raw: Vec<f64> = (0..BEAMS)
        .map(|i| {
            let bearing = state.heading - FRAC_PI_2 + i as f64 * increment;
            let direction = Vector2::new(bearing.cos(), bearing.sin());
            match obstacle.range_along(&state.position, &direction) {
                Some(range) if range < MAX_RANGE => range,
                _ => 0.0, // no return
            }
        })
        .collect();
    RangeProfile::from_raw(&raw, -FRAC_PI_2, FRAC_PI_2)
}

/// Moves the vehicle for `dt` under (v, w)
fn integrate(state: &mut KinematicState, v: f64, w: f64, dt: f64) {
    state.heading += w * dt;
    state.position += Vector2::new(state.heading.cos(), state.heading.sin()) * v * dt;
    state.v = v;
    state.w = w;
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("Starting Vigil replay...");

    let config = match std::env::args().nth(1) {
        Some(path) => VigilConfig::from_yaml_file(&path)?,
        None => VigilConfig::default(),
    };
    let store = YamlCaseStore::open(&config.case_store_path)?;
    let dt = config.navigation.dt;
    let cruise = 1.0;

    let goal = Point2::new(20.0, 0.0);
    let obstacle = Obstacle {
        center: Point2::new(9.0, 0.3),
        radius: 0.8,
    };
    let mut state = KinematicState::at_rest(config.vehicle).with_velocity(cruise, 0.0);
    let mut core = AvoidanceCore::new(config, store);
    let mut command = (cruise, 0.0);

    for cycle in 0..CYCLES {
        let timestamp = cycle as f64 * dt;
        let to_goal = goal - state.position;
        let goal_bearing = UnitComplex::new(to_goal.y.atan2(to_goal.x) - state.heading)
            .angle()
            .to_degrees();

        let input = CycleInput {
            profile: scan(&state, &obstacle),
            state,
            goal_bearing_degrees: goal_bearing,
            timestamp,
            dt,
        };

        match core.run_cycle(&input) {
            CycleOutcome::Command(report) => {
                info!(
                    "cycle {}: {} d={:.2} angle={:.1} -> v={:.2} w={:.2} ({})",
                    cycle,
                    report.scenario,
                    report.obstacle_distance,
                    report.obstacle_angle_deg,
                    report.command.linear,
                    report.command.angular,
                    report.label
                );
                if let RetainStatus::Failed(reason) = &report.retain {
                    warn!("Case not retained: {}", reason);
                }
                command = (report.command.linear, report.command.angular);
            }
            CycleOutcome::Released => {
                info!("cycle {}: avoidance finished, resuming cruise", cycle);
                command = (cruise, 0.0);
            }
            CycleOutcome::Hold(reason) => info!("cycle {}: holding ({:?})", cycle, reason),
            CycleOutcome::Idle => {
                // Simple goal seeking stands in for the external navigation
                let turn = goal_bearing.to_radians().clamp(-0.5, 0.5);
                command = (cruise, turn);
            }
        }

        integrate(&mut state, command.0, command.1, dt);
        if (goal - state.position).norm() < 0.5 {
            info!("Goal reached after {} cycles", cycle + 1);
            break;
        }
        if obstacle.center.coords.metric_distance(&state.position.coords) < obstacle.radius {
            error!("Collision at cycle {}", cycle);
            break;
        }
    }

    let stored = core.cbr().store().all_cases()?.len();
    info!("Replay finished, {} cases in {}", stored, core.config().case_store_path.display());
    Ok(())
}
