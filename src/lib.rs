//! Vigil - reactive obstacle avoidance decision core
//!
//! This library turns a smoothed range profile, the vehicle's kinematic state
//! and a goal bearing into a velocity command on every sensor cycle. It
//! classifies the obstacle layout, weights a dynamic-window search with fuzzy
//! rules and reuses past decisions through case-based reasoning.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod cbr;
pub mod core;
pub mod fuzzy;
pub mod navigation;

// Re-export commonly used items for easier access
pub use crate::cbr::{CaseLabel, CaseStore, CbrConfig, CbrEngine, MemoryCaseStore, RetainStatus, YamlCaseStore};
pub use crate::core::{AvoidanceCore, CycleInput, CycleOutcome, KinematicState, Mode, RangeProfile, Scenario};
pub use crate::fuzzy::{FuzzyConfig, FuzzyEngine, FuzzyWeights};
pub use crate::navigation::{DwaPlanner, NavigationConfig, VelocityCommand};

use crate::cbr::CaseStoreError;
use crate::core::{ClassifierConfig, PerceptionConfig, VehicleLimits};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Main configuration structure for Vigil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Actuation limits of the vehicle
    pub vehicle: VehicleLimits,
    /// Cone widths and trigger distances
    pub perception: PerceptionConfig,
    /// Scenario classifier tuning
    pub classifier: ClassifierConfig,
    /// Fuzzy membership parameters
    pub fuzzy: FuzzyConfig,
    /// Planner and command-rate settings
    pub navigation: NavigationConfig,
    /// Case-based reasoning tuning
    pub cbr: CbrConfig,
    /// Location of the YAML case store
    pub case_store_path: PathBuf,
}

impl Default for VigilConfig {
    fn default() -> Self {
        VigilConfig {
            vehicle: VehicleLimits::default(),
            perception: PerceptionConfig::default(),
            classifier: ClassifierConfig::default(),
            fuzzy: FuzzyConfig::default(),
            navigation: NavigationConfig::default(),
            cbr: CbrConfig::default(),
            case_store_path: PathBuf::from("cases.yaml"),
        }
    }
}

impl VigilConfig {
    /// Loads a configuration from YAML; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, VigilError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: VigilConfig =
            serde_yaml::from_reader(file).map_err(|e| VigilError::Config(e.to_string()))?;
        let config = config.validated()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Rejects values the decision core cannot work with and limits cone widths
    /// to a full turn
    pub fn validated(mut self) -> Result<Self, VigilError> {
        self.fuzzy.validate().map_err(VigilError::Config)?;
        if !(self.navigation.dt.is_finite() && self.navigation.dt > 0.0) {
            return Err(VigilError::Config(format!(
                "navigation dt must be positive, got {}",
                self.navigation.dt
            )));
        }
        let clamped = self.perception.clamped();
        if clamped != self.perception {
            log::warn!(
                "Cone widths clamped to narrow {:.1} deg, wide {:.1} deg",
                clamped.narrow_cone_deg, clamped.wide_cone_deg
            );
            self.perception = clamped;
        }
        Ok(self)
    }
}

/// Vigil error types
#[derive(Debug)]
pub enum VigilError {
    /// Configuration could not be parsed
    Config(String),
    /// File access failed
    Io(std::io::Error),
    /// Case store failure
    CaseStore(CaseStoreError),
}

impl std::fmt::Display for VigilError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            VigilError::Config(msg) => write!(f, "Configuration error: {}", msg),
            VigilError::Io(err) => write!(f, "I/O error: {}", err),
            VigilError::CaseStore(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for VigilError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VigilError::Io(err) => Some(err),
            VigilError::CaseStore(err) => Some(err),
            VigilError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        VigilError::Io(err)
    }
}

impl From<CaseStoreError> for VigilError {
    fn from(err: CaseStoreError) -> Self {
        VigilError::CaseStore(err)
    }
}
