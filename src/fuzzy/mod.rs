//! Fuzzy weight engine for Vigil
//!
//! Maps the closest obstacle's distance and bearing to the three weights of the
//! dynamic-window cost (heading, clearance, speed). Rules live in a static
//! table; inference is min for AND, max for aggregation and centroid
//! defuzzification.
pub mod config;
pub mod membership;

pub use config::FuzzyConfig;
pub use membership::{Membership, Universe};

use config::OutputSets;
use log::debug;

/// Weights of the dynamic-window cost terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyWeights {
    /// Heading weight, in [0, 1]
    pub alpha: f64,
    /// Clearance weight, in [0, 10]
    pub beta: f64,
    /// Speed weight, in [0, 1]
    pub gamma: f64,
}

/// Distance terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceTerm {
    /// Close to the vehicle
    Near,
    /// Around the calibration midpoint
    Medium,
    /// Far from the vehicle
    Distant,
}

/// Bearing terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleTerm {
    /// Off to the negative side
    LateralLeft,
    /// Straight ahead
    Frontal,
    /// Off to the positive side
    LateralRight,
}

/// Output terms, shared by the three weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Low set
    Low,
    /// Medium set
    Medium,
    /// High set
    High,
}

/// One rule: both antecedents fire the three consequents at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Distance antecedent
    pub distance: DistanceTerm,
    /// Bearing antecedent
    pub angle: AngleTerm,
    /// Heading consequent
    pub alpha: Level,
    /// Clearance consequent
    pub beta: Level,
    /// Speed consequent
    pub gamma: Level,
}

const fn rule(distance: DistanceTerm, angle: AngleTerm, alpha: Level, beta: Level, gamma: Level) -> Rule {
    Rule { distance, angle, alpha, beta, gamma }
}

use AngleTerm::{Frontal, LateralLeft, LateralRight};
use DistanceTerm::{Distant, Medium as Mid, Near};
use Level::{High, Low, Medium};

/// Obstacle-avoidance rule base
pub const RULES: [Rule; 9] = [
    rule(Near, Frontal, Low, High, Low),
    rule(Near, LateralRight, High, Low, Low),
    rule(Near, LateralLeft, High, Low, Low),
    rule(Mid, Frontal, Medium, High, Low),
    rule(Mid, LateralRight, High, Low, Low),
    rule(Mid, LateralLeft, High, Low, Low),
    rule(Distant, Frontal, Medium, High, Low),
    rule(Distant, LateralRight, High, Low, Low),
    rule(Distant, LateralLeft, High, Low, Low),
];

/// Firing strength collected per output term
#[derive(Debug, Clone, Copy, Default)]
struct Activation {
    low: f64,
    medium: f64,
    high: f64,
}

impl Activation {
    fn raise(&mut self, level: Level, strength: f64) {
        let slot = match level {
            Level::Low => &mut self.low,
            Level::Medium => &mut self.medium,
            Level::High => &mut self.high,
        };
        *slot = slot.max(strength);
    }

    /// Clipped sets aggregated by max, then defuzzified
    fn defuzzify(&self, sets: &OutputSets) -> f64 {
        let aggregated = |x: f64| {
            sets.low.degree(x).min(self.low)
                .max(sets.medium.degree(x).min(self.medium))
                .max(sets.high.degree(x).min(self.high))
        };
        sets.universe.centroid(aggregated).unwrap_or_else(|| {
            debug!("No rule fired, falling back to universe midpoint");
            sets.universe.midpoint()
        })
    }
}

/// Stateless fuzzy inference over the static rule table
#[derive(Debug, Clone)]
pub struct FuzzyEngine {
    config: FuzzyConfig,
}

impl FuzzyEngine {
    /// Creates an engine with the given sets
    pub fn new(config: FuzzyConfig) -> Self {
        FuzzyEngine { config }
    }

    /// Sets in use
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Infers the cost weights for the closest obstacle.
    /// Inputs outside their universes are clamped first.
    pub fn infer(&self, distance: f64, angle_degrees: f64) -> FuzzyWeights {
        let distance = self.config.distance_universe.clamp(distance);
        let angle = self.config.angle_universe.clamp(angle_degrees);

        let (mut alpha, mut beta, mut gamma) =
            (Activation::default(), Activation::default(), Activation::default());
        for rule in &RULES {
            let strength = self.distance_degree(rule.distance, distance)
                .min(self.angle_degree(rule.angle, angle));
            alpha.raise(rule.alpha, strength);
            beta.raise(rule.beta, strength);
            gamma.raise(rule.gamma, strength);
        }

        let weights = FuzzyWeights {
            alpha: alpha.defuzzify(&self.config.alpha),
            beta: beta.defuzzify(&self.config.beta),
            gamma: gamma.defuzzify(&self.config.gamma),
        };
        debug!(
            "Fuzzy weights at d={:.2}, angle={:.1}: alpha={:.3}, beta={:.3}, gamma={:.3}",
            distance, angle, weights.alpha, weights.beta, weights.gamma
        );
        weights
    }

    fn distance_degree(&self, term: DistanceTerm, x: f64) -> f64 {
        let sets = &self.config.distance;
        match term {
            DistanceTerm::Near => sets.near.degree(x),
            DistanceTerm::Medium => sets.medium.degree(x),
            DistanceTerm::Distant => sets.distant.degree(x),
        }
    }

    fn angle_degree(&self, term: AngleTerm, x: f64) -> f64 {
        let sets = &self.config.angle;
        match term {
            AngleTerm::LateralLeft => sets.lateral_left.degree(x),
            AngleTerm::Frontal => sets.frontal.degree(x),
            AngleTerm::LateralRight => sets.lateral_right.degree(x),
        }
    }
}

impl Default for FuzzyEngine {
    fn default() -> Self {
        FuzzyEngine::new(FuzzyConfig::default())
    }
}
