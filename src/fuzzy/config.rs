// src/fuzzy/config.rs
// Membership parameters and universes of the fuzzy weight engine.

use serde::{Deserialize, Serialize};

use super::membership::{Membership, Universe};

/// Linguistic sets of the obstacle-distance input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSets {
    /// Descending set below the calibration midpoint
    pub near: Membership,
    /// Bell around the calibration midpoint
    pub medium: Membership,
    /// Ascending set above the calibration midpoint
    pub distant: Membership,
}

/// Linguistic sets of the obstacle-bearing input (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSets {
    /// Negative-bearing side
    pub lateral_left: Membership,
    /// Straight ahead
    pub frontal: Membership,
    /// Positive-bearing side
    pub lateral_right: Membership,
}

/// Low/medium/high sets of one output weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputSets {
    /// Domain the weight is defuzzified over
    pub universe: Universe,
    /// Low set
    pub low: Membership,
    /// Medium set
    pub medium: Membership,
    /// High set
    pub high: Membership,
}

/// Full fuzzy engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Input domain of the obstacle distance
    pub distance_universe: Universe,
    /// Input domain of the obstacle bearing (degrees)
    pub angle_universe: Universe,
    /// Distance sets
    pub distance: DistanceSets,
    /// Bearing sets
    pub angle: AngleSets,
    /// Heading weight
    pub alpha: OutputSets,
    /// Clearance weight
    pub beta: OutputSets,
    /// Speed weight
    pub gamma: OutputSets,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            distance_universe: Universe::new(0.0, 6.0, 0.1),
            angle_universe: Universe::new(-120.0, 120.0, 1.0),
            distance: DistanceSets {
                near: Membership::Sigmoid { center: 2.0, slope: -6.0 },
                medium: Membership::Gaussian { mean: 3.0, sigma: 0.3 },
                distant: Membership::Sigmoid { center: 4.0, slope: 6.0 },
            },
            angle: AngleSets {
                lateral_left: Membership::Trapezoid { a: -180.0, b: -120.0, c: -60.0, d: -30.0 },
                frontal: Membership::Gaussian { mean: 0.0, sigma: 10.0 },
                lateral_right: Membership::Trapezoid { a: 30.0, b: 60.0, c: 120.0, d: 180.0 },
            },
            alpha: OutputSets {
                universe: Universe::new(0.0, 1.0, 0.01),
                low: Membership::Triangle { a: 0.0, b: 0.0, c: 0.5 },
                medium: Membership::Triangle { a: 0.4, b: 0.6, c: 0.6 },
                high: Membership::Triangle { a: 0.6, b: 1.0, c: 1.0 },
            },
            beta: OutputSets {
                universe: Universe::new(0.0, 10.0, 0.1),
                low: Membership::Triangle { a: 0.0, b: 3.0, c: 6.0 },
                medium: Membership::Triangle { a: 5.0, b: 7.0, c: 7.0 },
                high: Membership::Triangle { a: 7.0, b: 10.0, c: 10.0 },
            },
            gamma: OutputSets {
                universe: Universe::new(0.0, 1.0, 0.01),
                low: Membership::Triangle { a: 0.0, b: 0.0, c: 0.6 },
                medium: Membership::Triangle { a: 0.5, b: 0.7, c: 0.7 },
                high: Membership::Triangle { a: 0.7, b: 1.0, c: 1.0 },
            },
        }
    }
}

impl FuzzyConfig {
    /// Rejects universes that cannot be sampled.
    pub fn validate(&self) -> Result<(), String> {
        let universes = [
            ("distance", &self.distance_universe),
            ("angle", &self.angle_universe),
            ("alpha", &self.alpha.universe),
            ("beta", &self.beta.universe),
            ("gamma", &self.gamma.universe),
        ];
        for (name, universe) in universes {
            universe.validate().map_err(|e| format!("fuzzy {}: {}", name, e))?;
        }
        Ok(())
    }
}
