//! Navigation system for Vigil
//!
//! This module holds the dynamic-window velocity planner and the command gate
//! that rate-limits what reaches the vehicle.

pub mod controller;
pub mod planner;

pub use controller::CommandGate;
pub use planner::{DwaPlanner, DynamicWindow, Plan};

use serde::{Deserialize, Serialize};

/// Navigation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Planning horizon and minimum command interval (seconds)
    pub dt: f64,
    /// Linear velocity samples across the dynamic window
    pub v_resolution: usize,
    /// Angular velocity samples across the dynamic window
    pub w_resolution: usize,
    /// Distance assumed along a curvature without any return
    pub clear_path_distance: f64,
    /// Multiple of `dt` the cones must stay clear before avoidance is released
    pub release_factor: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            dt: 0.17,
            v_resolution: 12,
            w_resolution: 12,
            clear_path_distance: 6.0,
            release_factor: 1.1,
        }
    }
}

/// Velocity command for the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    /// Linear velocity (m/s)
    pub linear: f64,
    /// Angular velocity (rad/s)
    pub angular: f64,
}

impl VelocityCommand {
    /// Creates a command
    pub fn new(linear: f64, angular: f64) -> Self {
        VelocityCommand { linear, angular }
    }

    /// Zero velocities
    pub fn stop() -> Self {
        VelocityCommand::new(0.0, 0.0)
    }
}
