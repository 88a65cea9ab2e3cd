// core/state.rs

// Tracks whether the vehicle is avoiding an obstacle (Avoiding) or left to the
// external navigation layer (Idle). Engages as soon as the selected cone sees
// an obstacle inside its trigger distance and releases only once both cones
// are clear and no command went out for the debounce interval.

// Dependencies
use log::{info, warn};

use super::perception::{PerceptionConfig, Proximity};

/// Avoidance modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// External navigation in control
    Idle,
    /// Decision core issues velocity commands
    Avoiding,
}

/// Mode change produced by one update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Idle to Avoiding
    Engaged,
    /// Avoiding to Idle
    Released,
    /// No change
    Unchanged,
}

/// Avoidance mode machine
#[derive(Debug, Clone)]
pub struct AvoidanceState {
    current_mode: Mode,
}

impl Default for AvoidanceState {
    fn default() -> Self {
        Self::new()
    }
}

impl AvoidanceState {
    /// Starts Idle
    pub fn new() -> Self {
        AvoidanceState { current_mode: Mode::Idle }
    }

    /// Applies one proximity assessment.
    /// `quiet` tells whether the debounce interval passed since the last command.
    pub fn update(
        &mut self,
        proximity: &Proximity,
        perception: &PerceptionConfig,
        quiet: bool,
    ) -> Transition {
        match self.current_mode {
            Mode::Idle if proximity.is_triggered() => {
                let closest = proximity.closest();
                self.current_mode = Mode::Avoiding;
                info!(
                    "Transitioned to Avoiding: obstacle at {:.2} ({:?} cone, bearing {:.1} deg)",
                    closest.distance,
                    proximity.active,
                    closest.bearing_degrees()
                );
                Transition::Engaged
            }
            Mode::Avoiding if !proximity.is_triggered() && quiet && proximity.is_clear(perception) => {
                self.current_mode = Mode::Idle;
                info!(
                    "Transitioned to Idle: path clear (narrow {:.2}, wide {:.2})",
                    proximity.narrow.distance, proximity.wide.distance
                );
                Transition::Released
            }
            _ => Transition::Unchanged,
        }
    }

    /// Drops back to Idle regardless of proximity
    pub fn reset(&mut self) {
        if self.current_mode == Mode::Avoiding {
            warn!("Avoidance aborted by reset");
        }
        self.current_mode = Mode::Idle;
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.current_mode
    }
}
