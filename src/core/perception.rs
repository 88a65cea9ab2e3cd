// core/perception.rs

// Range-profile handling for the decision core. Wraps the smoothed scan handed
// over by the perception layer, maps between sample indices and body-frame
// bearings, and measures obstacle proximity inside the two forward cones that
// drive the avoidance trigger.

// Dependencies
use serde::{Deserialize, Serialize};

/// Stand-in distance reported for a cone without any return
pub const NO_RETURN_DISTANCE: f64 = 1000.0;

/// Smoothed range samples of one sensor cycle
#[derive(Debug, Clone, PartialEq)]
pub struct RangeProfile {
    ranges: Vec<f64>,
    angle_min: f64, // radians, body frame
    angle_max: f64, // radians, body frame
}

impl RangeProfile {
    /// Builds a profile from samples where "no return" is already infinite
    pub fn new(ranges: Vec<f64>, angle_min: f64, angle_max: f64) -> Self {
        RangeProfile {
            ranges,
            angle_min,
            angle_max,
        }
    }

    /// Builds a profile from raw scanner samples.
    /// Zero, negative and NaN samples carry no return and become infinite.
    pub fn from_raw(raw: &[f64], angle_min: f64, angle_max: f64) -> Self {
        let ranges = raw
            .iter()
            .map(|&r| if r.is_nan() || r <= 0.0 { f64::INFINITY } else { r })
            .collect();
        RangeProfile::new(ranges, angle_min, angle_max)
    }

    /// All samples, indexed by scan position
    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the profile holds no samples at all
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Lower angular bound (radians)
    pub fn angle_min(&self) -> f64 {
        self.angle_min
    }

    /// Upper angular bound (radians)
    pub fn angle_max(&self) -> f64 {
        self.angle_max
    }

    /// Angle covered by one sample (radians)
    pub fn angle_increment(&self) -> f64 {
        if self.ranges.is_empty() {
            return 0.0;
        }
        (self.angle_max - self.angle_min) / self.ranges.len() as f64
    }

    /// Sample index looking along a body-frame bearing, clamped to the scan
    pub fn index_of_bearing(&self, theta: f64) -> Option<usize> {
        let count = self.ranges.len();
        let span = self.angle_max - self.angle_min;
        if count == 0 || span <= 0.0 {
            return None;
        }
        let raw = ((theta - self.angle_min) / span * count as f64).round();
        Some(raw.clamp(0.0, (count - 1) as f64) as usize)
    }

    /// Body-frame bearing of a sample index (radians)
    pub fn bearing_of_index(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment()
    }

    /// Distance at a sample index, infinite when out of range
    pub fn distance_at(&self, index: usize) -> f64 {
        self.ranges.get(index).copied().unwrap_or(f64::INFINITY)
    }

    /// Samples that carry a return
    pub fn finite_samples(&self) -> Vec<f64> {
        self.ranges.iter().copied().filter(|r| r.is_finite()).collect()
    }

    /// Closest return inside a cone of `width` radians centered straight ahead
    pub fn closest_in_cone(&self, width: f64) -> Option<ConeReading> {
        let center = self.index_of_bearing(0.0)?;
        let increment = self.angle_increment();
        let half = (((width / 2.0) / increment).round() as usize).min(self.ranges.len());
        let start = center.saturating_sub(half);
        let end = center.saturating_add(half).min(self.ranges.len()).max(start + 1);

        // First minimum wins on ties
        let (offset, distance) = self.ranges[start..end]
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, r)| if r < best.1 { (i, r) } else { best });

        let bearing = ((start + offset) as f64 - center as f64) * increment;
        let distance = if distance.is_finite() { distance } else { NO_RETURN_DISTANCE };
        Some(ConeReading { distance, bearing })
    }
}

/// Closest obstacle inside one cone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeReading {
    /// Distance to the closest return
    pub distance: f64,
    /// Bearing of that return relative to straight ahead (radians)
    pub bearing: f64,
}

impl ConeReading {
    /// Bearing in degrees
    pub fn bearing_degrees(&self) -> f64 {
        self.bearing.to_degrees()
    }
}

/// Which cone drives the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cone {
    /// Narrow forward cone, long trigger distance
    Narrow,
    /// Wide cone, short trigger distance
    Wide,
}

/// Proximity geometry tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Width of the narrow forward cone (degrees)
    pub narrow_cone_deg: f64,
    /// Width of the wide cone (degrees)
    pub wide_cone_deg: f64,
    /// Trigger distance of the narrow cone
    pub safety_distance_to_start: f64,
    /// Trigger distance of the wide cone
    pub wide_trigger_distance: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        PerceptionConfig {
            narrow_cone_deg: 60.0,
            wide_cone_deg: 180.0,
            safety_distance_to_start: 6.0,
            wide_trigger_distance: 2.5,
        }
    }
}

/// Widest cone that still means something
pub const FULL_TURN_DEG: f64 = 360.0;

impl PerceptionConfig {
    /// Copy with both cone widths limited to `0..=360` degrees
    pub fn clamped(self) -> Self {
        let clamp = |deg: f64| if deg.is_nan() { 0.0 } else { deg.clamp(0.0, FULL_TURN_DEG) };
        PerceptionConfig {
            narrow_cone_deg: clamp(self.narrow_cone_deg),
            wide_cone_deg: clamp(self.wide_cone_deg),
            ..self
        }
    }
}

/// Proximity assessment of one profile against both cones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Reading of the narrow cone
    pub narrow: ConeReading,
    /// Reading of the wide cone
    pub wide: ConeReading,
    /// Cone selected for this cycle
    pub active: Cone,
    /// Trigger distance of the selected cone
    pub trigger_distance: f64,
}

impl Proximity {
    /// Reads both cones and selects the one driving the cycle.
    /// The narrow cone takes over as soon as it alone sees something inside
    /// its trigger distance.
    pub fn assess(profile: &RangeProfile, config: &PerceptionConfig) -> Option<Self> {
        let narrow = profile.closest_in_cone(config.narrow_cone_deg.to_radians())?;
        let wide = profile.closest_in_cone(config.wide_cone_deg.to_radians())?;

        let (active, trigger_distance) = if narrow.distance > config.safety_distance_to_start {
            (Cone::Wide, config.wide_trigger_distance)
        } else {
            (Cone::Narrow, config.safety_distance_to_start)
        };

        Some(Proximity {
            narrow,
            wide,
            active,
            trigger_distance,
        })
    }

    /// Reading of the selected cone
    pub fn closest(&self) -> ConeReading {
        match self.active {
            Cone::Narrow => self.narrow,
            Cone::Wide => self.wide,
        }
    }

    /// True when the selected cone sees an obstacle inside its trigger distance
    pub fn is_triggered(&self) -> bool {
        self.closest().distance < self.trigger_distance
    }

    /// True when both cones are clear of their trigger distances
    pub fn is_clear(&self, config: &PerceptionConfig) -> bool {
        self.narrow.distance > config.safety_distance_to_start
            && self.wide.distance > config.wide_trigger_distance
    }
}
