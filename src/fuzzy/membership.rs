// src/fuzzy/membership.rs
// Membership shapes and centroid defuzzification over a discretized universe.

use serde::{Deserialize, Serialize};

/// Shape of a fuzzy set over a scalar domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Membership {
    /// Logistic curve; a negative `slope` gives a descending set.
    Sigmoid { center: f64, slope: f64 },
    /// Bell curve.
    Gaussian { mean: f64, sigma: f64 },
    /// Triangle with feet `a`, `c` and peak `b`. `a == b` or `b == c` gives a shoulder.
    Triangle { a: f64, b: f64, c: f64 },
    /// Trapezoid with feet `a`, `d` and plateau `b..=c`.
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
}

impl Membership {
    /// Degree of truth of `x`, in [0, 1].
    pub fn degree(&self, x: f64) -> f64 {
        match *self {
            Membership::Sigmoid { center, slope } => 1.0 / (1.0 + (-slope * (x - center)).exp()),
            Membership::Gaussian { mean, sigma } => {
                (-(x - mean).powi(2) / (2.0 * sigma.powi(2))).exp()
            }
            Membership::Triangle { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            Membership::Trapezoid { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        }
    }
}

/// Closed interval sampled at a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Sampling step used for defuzzification
    pub step: f64,
}

impl Universe {
    /// Creates a universe.
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Universe { min, max, step }
    }

    /// Clamps an input into the universe.
    pub fn clamp(&self, x: f64) -> f64 {
        if x.is_nan() {
            return self.min;
        }
        x.clamp(self.min, self.max)
    }

    /// Checks that the bounds are finite and ordered and the step is positive.
    pub fn validate(&self) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(format!("invalid universe bounds [{}, {}]", self.min, self.max));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(format!("universe step must be positive, got {}", self.step));
        }
        Ok(())
    }

    /// Sample points, both bounds included. A universe failing validation yields a single point.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        let count = if self.validate().is_ok() {
            ((self.max - self.min) / self.step).round() as usize
        } else {
            0
        };
        (0..=count).map(move |i| (self.min + i as f64 * self.step).min(self.max))
    }

    /// Midpoint of the interval.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Center of gravity of an aggregated set; `None` when the set is empty.
    pub fn centroid(&self, aggregated: impl Fn(f64) -> f64) -> Option<f64> {
        let (moment, area) = self.points().fold((0.0, 0.0), |(m, a), x| {
            let mu = aggregated(x);
            (m + x * mu, a + mu)
        });
        (area > 0.0).then(|| (moment / area).clamp(self.min, self.max))
    }
}
