// core/scenario.rs

// Scenario classification for the decision core. Clusters the finite samples of
// the current range profile with a one-dimensional DBSCAN, compares each cluster
// with the same scan positions of the previous cycle to spot moving obstacles,
// and labels the local obstacle layout. The previous-cycle baseline lives in an
// explicit session object owned by the caller.

// Dependencies
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use super::perception::RangeProfile;

/// Coarse classification of the local obstacle layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// A single obstacle cluster
    IsolatedObstacle,
    /// Two clusters, one on each side of a gap
    NarrowCorridor,
    /// A cluster moved more than the vehicle's own motion explains
    MovingObstacle,
    /// More than two clusters
    Unknown,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scenario::IsolatedObstacle => write!(f, "isolated obstacle"),
            Scenario::NarrowCorridor => write!(f, "narrow corridor"),
            Scenario::MovingObstacle => write!(f, "moving obstacle"),
            Scenario::Unknown => write!(f, "unknown scenario"),
        }
    }
}

/// Classifier tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// DBSCAN neighborhood radius (distance units)
    pub eps: f64,
    /// DBSCAN minimum neighborhood size, the point itself included
    pub min_samples: usize,
    /// Slack added to the expected displacement before calling it movement
    pub movement_margin: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            eps: 0.1,
            min_samples: 10,
            movement_margin: 0.2,
        }
    }
}

/// Cluster label of every finite sample; `None` marks noise
pub type ClusterAssignment = Vec<Option<usize>>;

/// Previous-cycle baseline
#[derive(Debug, Clone)]
struct Baseline {
    samples: Vec<f64>,
    timestamp: f64,
}

/// Classifier state carried from one cycle to the next
#[derive(Debug, Clone)]
pub struct ClassifierSession {
    config: ClassifierConfig,
    previous: Option<Baseline>,
}

impl ClassifierSession {
    /// Fresh session without baseline
    pub fn new(config: ClassifierConfig) -> Self {
        ClassifierSession {
            config,
            previous: None,
        }
    }

    /// True once a baseline has been stored
    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    /// Drops the baseline, the next call seeds a new one
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Classifies the current profile.
    /// Returns `None` on the seeding cycle, on an empty profile and when no
    /// cluster survives. The baseline is replaced on every call.
    pub fn classify(
        &mut self,
        profile: &RangeProfile,
        linear_velocity: f64,
        timestamp: f64,
    ) -> Option<Scenario> {
        let samples = profile.finite_samples();
        let previous = self.previous.replace(Baseline {
            samples: samples.clone(),
            timestamp,
        });

        if samples.is_empty() {
            debug!("No finite samples, scenario skipped");
            return None;
        }
        let previous = match previous {
            Some(previous) => previous,
            None => {
                debug!("Classifier baseline seeded at t={:.3}", timestamp);
                return None;
            }
        };

        let labels = dbscan_1d(&samples, self.config.eps, self.config.min_samples);
        let clusters = labels.iter().flatten().collect::<BTreeSet<_>>().len();
        let dt = timestamp - previous.timestamp;
        let moving = self.detect_movement(&samples, &previous.samples, &labels, linear_velocity, dt);

        let scenario = if moving {
            Some(Scenario::MovingObstacle)
        } else {
            match clusters {
                0 => None,
                1 => Some(Scenario::IsolatedObstacle),
                2 => Some(Scenario::NarrowCorridor),
                _ => Some(Scenario::Unknown),
            }
        };
        debug!("Classified {} clusters (moving: {}) as {:?}", clusters, moving, scenario);
        scenario
    }

    /// True when some cluster's mean range shifted by more than `v * dt + margin`.
    /// Clusters cannot be aligned when the two profiles differ in size and are skipped.
    fn detect_movement(
        &self,
        current: &[f64],
        previous: &[f64],
        labels: &[Option<usize>],
        linear_velocity: f64,
        dt: f64,
    ) -> bool {
        if current.len() != previous.len() {
            return false;
        }
        let threshold = linear_velocity * dt + self.config.movement_margin;

        let cluster_ids: BTreeSet<usize> = labels.iter().flatten().copied().collect();
        cluster_ids.into_iter().any(|id| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, label)| **label == Some(id))
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                return false;
            }
            let count = members.len() as f64;
            let now = members.iter().map(|&i| current[i]).sum::<f64>() / count;
            let before = members.iter().map(|&i| previous[i]).sum::<f64>() / count;
            (now - before).abs() > threshold
        })
    }
}

/// Density-based clustering of scalar samples.
/// Cluster ids are handed out in scan order of the first core point reached.
pub fn dbscan_1d(samples: &[f64], eps: f64, min_samples: usize) -> ClusterAssignment {
    let n = samples.len();
    let mut labels: ClusterAssignment = vec![None; n];
    if n == 0 {
        return labels;
    }

    // Sorted view so neighborhoods are contiguous ranges
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| samples[a].total_cmp(&samples[b]));
    let sorted: Vec<f64> = order.iter().map(|&i| samples[i]).collect();

    let neighbors = |i: usize| -> Vec<usize> {
        let value = samples[i];
        let lo = sorted.partition_point(|&x| x < value - eps);
        let hi = sorted.partition_point(|&x| x <= value + eps);
        order[lo..hi].to_vec()
    };
    let is_core: Vec<bool> = (0..n).map(|i| neighbors(i).len() >= min_samples).collect();

    let mut next_id = 0;
    for seed in 0..n {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }
        let id = next_id;
        next_id += 1;
        labels[seed] = Some(id);

        let mut frontier: VecDeque<usize> = VecDeque::from(vec![seed]);
        while let Some(point) = frontier.pop_front() {
            if !is_core[point] {
                continue;
            }
            for neighbor in neighbors(point) {
                if labels[neighbor].is_none() {
                    labels[neighbor] = Some(id);
                    frontier.push_back(neighbor);
                }
            }
        }
    }

    labels
}
