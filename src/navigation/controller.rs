// src/navigation/controller.rs
// Gates velocity commands so the vehicle never receives them faster than the
// planner's own horizon.

use log::debug;

/// Minimum-interval gate for emitted commands
#[derive(Debug, Clone, Default)]
pub struct CommandGate {
    last_command_at: Option<f64>,
}

impl CommandGate {
    /// Gate that lets the first command through
    pub fn new() -> Self {
        CommandGate { last_command_at: None }
    }

    /// Seconds since the last emitted command, `None` before the first one
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.last_command_at.map(|last| now - last)
    }

    /// True when at least `interval` has passed since the last command
    pub fn is_open(&self, now: f64, interval: f64) -> bool {
        match self.elapsed(now) {
            Some(elapsed) if elapsed < interval => {
                debug!("Command gate closed: {:.3}s of {:.3}s elapsed", elapsed, interval);
                false
            }
            _ => true,
        }
    }

    /// True when no command went out for longer than `interval`
    pub fn quiet_for(&self, now: f64, interval: f64) -> bool {
        self.elapsed(now).is_none_or(|elapsed| elapsed > interval)
    }

    /// Records an emitted command
    pub fn record(&mut self, now: f64) {
        self.last_command_at = Some(now);
    }
}
