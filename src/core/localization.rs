// core/localization.rs

// Kinematic snapshot of the vehicle as handed over by the telemetry layer each
// cycle: pose, current velocities and the actuation limits the planner must
// respect. The decision core reads it and never mutates it.

// Dependencies
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Actuation limits of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleLimits {
    /// Maximum linear velocity (m/s)
    pub max_v: f64,
    /// Minimum linear velocity (m/s)
    pub min_v: f64,
    /// Maximum angular velocity magnitude (rad/s)
    pub max_w: f64,
    /// Maximum linear acceleration (m/s^2)
    pub max_acc_v: f64,
    /// Maximum angular acceleration (rad/s^2)
    pub max_acc_w: f64,
}

impl Default for VehicleLimits {
    fn default() -> Self {
        VehicleLimits {
            max_v: 2.55,
            min_v: 0.0,
            max_w: std::f64::consts::PI,
            max_acc_v: 0.9,
            max_acc_w: std::f64::consts::FRAC_PI_2,
        }
    }
}

impl VehicleLimits {
    /// Clamps a command to the absolute limits.
    /// Linear velocity is only capped from above so a stop stays a stop.
    pub fn clamp(&self, v: f64, w: f64) -> (f64, f64) {
        (v.min(self.max_v), w.clamp(-self.max_w, self.max_w))
    }
}

/// Kinematic state of the vehicle for one decision cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    /// Position in the odometry frame (meters)
    pub position: Point2<f64>,
    /// Heading in the odometry frame (radians)
    pub heading: f64,
    /// Current linear velocity (m/s)
    pub v: f64,
    /// Current angular velocity (rad/s)
    pub w: f64,
    /// Actuation limits
    pub limits: VehicleLimits,
}

impl KinematicState {
    /// Vehicle at rest at the origin with the given limits
    pub fn at_rest(limits: VehicleLimits) -> Self {
        KinematicState {
            position: Point2::origin(),
            heading: 0.0,
            v: 0.0,
            w: 0.0,
            limits,
        }
    }

    /// Same state with updated velocities
    pub fn with_velocity(mut self, v: f64, w: f64) -> Self {
        self.v = v;
        self.w = w;
        self
    }
}
