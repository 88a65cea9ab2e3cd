// src/navigation/planner.rs
// Fuzzy-weighted dynamic window planner. Samples the kinematically reachable
// (v, w) window, drops every candidate that could not stop before the obstacle
// on its curvature, and keeps the best-scoring one.

use log::debug;
use nalgebra::UnitComplex;

use super::NavigationConfig;
use crate::core::localization::{KinematicState, VehicleLimits};
use crate::core::perception::RangeProfile;
use crate::fuzzy::FuzzyWeights;

/// Reachable velocities one control step ahead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicWindow {
    /// Lowest reachable linear velocity
    pub min_v: f64,
    /// Highest reachable linear velocity
    pub max_v: f64,
    /// Lowest reachable angular velocity
    pub min_w: f64,
    /// Highest reachable angular velocity
    pub max_w: f64,
}

impl DynamicWindow {
    /// Intersects the vehicle limits with what bounded acceleration reaches in `dt`.
    pub fn compute(state: &KinematicState, dt: f64) -> Self {
        let limits = &state.limits;
        DynamicWindow {
            min_v: limits.min_v.max(state.v - limits.max_acc_v * dt),
            max_v: limits.max_v.min(state.v + limits.max_acc_v * dt),
            min_w: (-limits.max_w).max(state.w - limits.max_acc_w * dt),
            max_w: limits.max_w.min(state.w + limits.max_acc_w * dt),
        }
    }

    /// Grid candidates, linear velocity outer and angular velocity inner.
    pub fn candidates(&self, v_resolution: usize, w_resolution: usize) -> Vec<(f64, f64)> {
        let ws = linspace(self.min_w, self.max_w, w_resolution);
        linspace(self.min_v, self.max_v, v_resolution)
            .into_iter()
            .flat_map(|v| ws.iter().map(move |&w| (v, w)))
            .collect()
    }
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Largest velocities that still stop within `distance` at full deceleration.
/// The angular bound carries the sign of `w`.
pub fn safety_stop(limits: &VehicleLimits, distance: f64, w: f64) -> (f64, f64) {
    let safe_v = (2.0 * distance * limits.max_acc_v).sqrt().min(limits.max_v);
    let safe_w = (sign(w) * (2.0 * distance * limits.max_acc_w).sqrt()).clamp(-limits.max_w, limits.max_w);
    (safe_v, safe_w)
}

/// True when (v, w) leaves enough room to stop before an obstacle at `distance`.
pub fn is_stoppable(limits: &VehicleLimits, distance: f64, v: f64, w: f64) -> bool {
    let (safe_v, safe_w) = safety_stop(limits, distance, w);
    if v > safe_v {
        return false;
    }
    if safe_w > 0.0 && w > 0.0 {
        w <= safe_w
    } else {
        w >= safe_w
    }
}

/// Alignment with the goal: pi when heading straight at it, 0 when facing away.
pub fn heading_cost(theta: f64, goal_bearing: f64) -> f64 {
    let diff = UnitComplex::new(theta - goal_bearing).angle();
    std::f64::consts::PI - diff.abs()
}

/// Planner result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    /// Selected linear velocity
    pub v: f64,
    /// Selected angular velocity
    pub w: f64,
    /// Cost of the selection, `None` when no candidate was feasible
    pub cost: Option<f64>,
    /// Candidates dropped by the safety-stop filter
    pub rejected: usize,
}

/// Dynamic window planner
#[derive(Debug, Clone)]
pub struct DwaPlanner {
    config: NavigationConfig,
}

impl DwaPlanner {
    /// Creates a planner
    pub fn new(config: NavigationConfig) -> Self {
        DwaPlanner { config }
    }

    /// Best (v, w) for this cycle, clamped to the vehicle limits.
    /// Falls back to a full stop when no candidate survives the safety filter.
    pub fn plan(
        &self,
        state: &KinematicState,
        profile: &RangeProfile,
        goal_bearing_degrees: f64,
        dt: f64,
        weights: &FuzzyWeights,
    ) -> Plan {
        let window = DynamicWindow::compute(state, dt);
        let goal = goal_bearing_degrees.to_radians();

        let mut best: Option<(f64, f64, f64)> = None;
        let mut rejected = 0;

        for (v, w) in window.candidates(self.config.v_resolution, self.config.w_resolution) {
            let theta_body = w * dt;
            let theta_global = state.heading + theta_body;

            let Some(index) = profile.index_of_bearing(theta_body) else {
                break;
            };
            let mut clearance = profile.distance_at(index);
            if clearance.is_infinite() {
                clearance = self.config.clear_path_distance;
            } else if !is_stoppable(&state.limits, clearance, v, w) {
                rejected += 1;
                continue;
            }

            let cost = weights.alpha * heading_cost(theta_global, goal)
                + weights.beta * clearance
                + weights.gamma * v;
            if best.is_none_or(|(_, _, top)| cost > top) {
                best = Some((v, w, cost));
            }
        }

        let plan = match best {
            Some((v, w, cost)) => {
                let (v, w) = state.limits.clamp(v, w);
                Plan { v, w, cost: Some(cost), rejected }
            }
            None => Plan { v: 0.0, w: 0.0, cost: None, rejected },
        };
        debug!(
            "DWA window v=[{:.2}, {:.2}] w=[{:.2}, {:.2}] -> v={:.3}, w={:.3} ({} rejected)",
            window.min_v, window.max_v, window.min_w, window.max_w, plan.v, plan.w, plan.rejected
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::PI;

    #[test]
    fn linspace_includes_endpoints() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn window_respects_limits_and_acceleration() {
        let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(1.0, 0.0);
        let window = DynamicWindow::compute(&state, 0.5);
        assert!((window.min_v - 0.55).abs() < 1e-9);
        assert!((window.max_v - 1.45).abs() < 1e-9);
        assert!((window.max_w - PI / 4.0).abs() < 1e-9);
        assert_eq!(window.candidates(12, 12).len(), 144);
    }

    #[rstest]
    #[case(0.0, 0.0, PI)]
    #[case(PI / 2.0, 0.0, PI / 2.0)]
    #[case(PI, 0.0, 0.0)]
    #[case(3.0 * PI / 2.0, 0.0, PI / 2.0)]
    #[case(-PI + 0.1, PI - 0.1, PI - 0.2)]
    fn heading_cost_wraps(#[case] theta: f64, #[case] goal: f64, #[case] expected: f64) {
        assert!((heading_cost(theta, goal) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(1.0, 0.5, 0.0, true)]
    #[case(1.0, 2.0, 0.0, false)]
    #[case(0.1, 0.0, 0.5, true)]
    #[case(0.1, 0.0, 1.0, false)]
    #[case(0.1, 0.0, -0.5, true)]
    #[case(0.1, 0.0, -1.0, false)]
    #[case(0.1, 0.5, 0.0, false)]
    fn safety_stop_is_direction_aware(#[case] distance: f64, #[case] v: f64, #[case] w: f64, #[case] ok: bool) {
        // At 0.1 m: safe v = sqrt(0.18) ~ 0.42, safe |w| = sqrt(0.1 * pi) ~ 0.56
        let limits = VehicleLimits::default();
        assert_eq!(is_stoppable(&limits, distance, v, w), ok);
    }

    #[test]
    fn blocked_grid_falls_back_to_stop() {
        let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(2.0, 0.0);
        let profile = RangeProfile::new(vec![0.05; 90], -PI / 2.0, PI / 2.0);
        let weights = FuzzyWeights { alpha: 0.2, beta: 9.0, gamma: 0.2 };
        let plan = DwaPlanner::new(NavigationConfig::default()).plan(&state, &profile, 0.0, 0.17, &weights);
        assert_eq!((plan.v, plan.w), (0.0, 0.0));
        assert_eq!(plan.cost, None);
        assert_eq!(plan.rejected, 144);
    }

    #[test]
    fn open_space_heads_for_goal() {
        let state = KinematicState::at_rest(VehicleLimits::default()).with_velocity(1.0, 0.0);
        let profile = RangeProfile::new(vec![f64::INFINITY; 90], -PI / 2.0, PI / 2.0);
        let weights = FuzzyWeights { alpha: 1.0, beta: 0.0, gamma: 0.1 };
        let plan = DwaPlanner::new(NavigationConfig::default()).plan(&state, &profile, 0.0, 0.17, &weights);
        assert!(plan.w.abs() < 0.05, "w {}", plan.w);
        assert!(plan.v > 1.0);
    }
}
