//! Case-based reasoning for Vigil
//!
//! Retrieves the closest remembered decision for the current obstacle
//! geometry, revises the planner's proposal against it, and retains new
//! decisions in the case store.

pub mod store;

pub use store::{Case, CaseStore, CaseStoreError, MemoryCaseStore, NewCase, SharedCaseStore, YamlCaseStore};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::localization::VehicleLimits;
use crate::core::scenario::Scenario;
use crate::navigation::planner::is_stoppable;

/// CBR tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbrConfig {
    /// Half-width of the distance window used by retrieval
    pub tolerance_distance: f64,
    /// Half-width of the bearing window used by retrieval (degrees)
    pub tolerance_angle: f64,
    /// Scale applied to a retrieved linear velocity
    pub case_v_scale: f64,
    /// Scale applied to a retrieved angular velocity
    pub case_w_scale: f64,
    /// Revised linear velocity is capped at this multiple of the planner's
    pub v_growth_cap: f64,
    /// Revised angular velocity is capped at this multiple of the planner's
    pub w_growth_cap: f64,
    /// Revisions projecting below this distance are rejected
    pub safety_floor: f64,
    /// Projections closer together than this count as equivalent
    pub stability_tolerance: f64,
}

impl Default for CbrConfig {
    fn default() -> Self {
        CbrConfig {
            tolerance_distance: 1.0,
            tolerance_angle: 5.0,
            case_v_scale: 1.1,
            case_w_scale: 1.2,
            v_growth_cap: 1.2,
            w_growth_cap: 1.3,
            safety_floor: 1.0,
            stability_tolerance: 0.1,
        }
    }
}

/// What the cycle learned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseLabel {
    /// No usable match; the issued command is worth remembering
    NewCase,
    /// The match already prescribes the planner's command
    OldCase,
    /// The match was adapted and issued instead of the planner's command
    ModifiedCase,
}

impl fmt::Display for CaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaseLabel::NewCase => write!(f, "new case"),
            CaseLabel::OldCase => write!(f, "old case"),
            CaseLabel::ModifiedCase => write!(f, "modified case"),
        }
    }
}

/// Why a revision fell back to the planner's command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Scaled case velocities cannot stop in time
    Unsafe,
    /// Projected distance under the case falls below the safety floor
    TooClose,
    /// Both projections are within the stability tolerance
    Marginal,
    /// The case does not project closer than the planner's command
    NoImprovement,
}

/// Result of revising the planner's command against a case
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Revision {
    /// Case-derived velocities to issue instead
    Modified {
        /// Revised linear velocity
        v: f64,
        /// Revised angular velocity
        w: f64,
    },
    /// Keep the planner's command
    Rejected(Rejection),
}

impl Revision {
    /// Outcome label of the revision
    pub fn label(&self) -> CaseLabel {
        match self {
            Revision::Modified { .. } => CaseLabel::ModifiedCase,
            Revision::Rejected(_) => CaseLabel::NewCase,
        }
    }
}

/// Final decision of the CBR stage for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionOutcome {
    /// Linear velocity to issue
    pub chosen_v: f64,
    /// Angular velocity to issue
    pub chosen_w: f64,
    /// What the cycle learned
    pub label: CaseLabel,
    /// Id of the retrieved case, if any
    pub matched_case: Option<u64>,
}

/// Result of retaining a decision
#[derive(Debug, Clone, PartialEq)]
pub enum RetainStatus {
    /// A new case was written under this id
    Stored(u64),
    /// The label did not call for a new case
    Skipped,
    /// Writing failed; the command stands regardless
    Failed(String),
}

/// Projected obstacle distance after applying (v, w) for `dt`.
/// Law of cosines without the final square root: thresholds downstream are
/// tuned against this squared magnitude.
pub fn predict_distance(initial_distance: f64, v: f64, w: f64, dt: f64) -> f64 {
    let ds = v * dt;
    let dtheta = w * dt;
    ds.powi(2) + initial_distance.powi(2) - 2.0 * ds * initial_distance * dtheta.cos()
}

fn scaled(delta: f64, tolerance: f64) -> f64 {
    if tolerance > 0.0 { delta / tolerance } else { delta }
}

/// Retrieve / revise / retain engine over a case store
#[derive(Debug)]
pub struct CbrEngine<S> {
    store: S,
    config: CbrConfig,
}

impl<S: CaseStore> CbrEngine<S> {
    /// Creates an engine over `store`
    pub fn new(store: S, config: CbrConfig) -> Self {
        CbrEngine { store, config }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tuning in use
    pub fn config(&self) -> &CbrConfig {
        &self.config
    }

    /// Every case of `scenario` inside the tolerance window, in insertion order
    pub fn similar_cases(
        &self,
        distance: f64,
        angle: f64,
        scenario: Scenario,
    ) -> Result<Vec<Case>, CaseStoreError> {
        let (tol_d, tol_a) = (self.config.tolerance_distance, self.config.tolerance_angle);
        let (d_lo, d_hi) = ((distance - tol_d).min(distance + tol_d), (distance - tol_d).max(distance + tol_d));
        let (a_lo, a_hi) = ((angle - tol_a).min(angle + tol_a), (angle - tol_a).max(angle + tol_a));

        Ok(self
            .store
            .all_cases()?
            .into_iter()
            .filter(|c| c.scenario == scenario)
            .filter(|c| (d_lo..=d_hi).contains(&c.distance_to_obstacle))
            .filter(|c| (a_lo..=a_hi).contains(&c.bearing_angle))
            .collect())
    }

    /// Closest similar case in tolerance-scaled distance; the most recent one wins ties
    pub fn retrieve(
        &self,
        distance: f64,
        angle: f64,
        scenario: Scenario,
    ) -> Result<Option<Case>, CaseStoreError> {
        let score = |c: &Case| {
            scaled((c.distance_to_obstacle - distance).abs(), self.config.tolerance_distance)
                + scaled((c.bearing_angle - angle).abs(), self.config.tolerance_angle)
        };
        let best = self
            .similar_cases(distance, angle, scenario)?
            .into_iter()
            .fold(None::<(f64, Case)>, |best, case| {
                let s = score(&case);
                match best {
                    Some((top, _)) if top < s => best,
                    _ => Some((s, case)),
                }
            });
        Ok(best.map(|(_, case)| case))
    }

    /// Revises the planner's command against a retrieved case
    #[allow(clippy::too_many_arguments)]
    pub fn revise(
        &self,
        limits: &VehicleLimits,
        min_dist: f64,
        best_v: f64,
        best_w: f64,
        case_v: f64,
        case_w: f64,
        dt: f64,
    ) -> Revision {
        let mut new_v = case_v * self.config.case_v_scale;
        let mut new_w = case_w * self.config.case_w_scale;
        if !is_stoppable(limits, min_dist, new_v, new_w) {
            return Revision::Rejected(Rejection::Unsafe);
        }

        new_v = new_v.min(best_v * self.config.v_growth_cap);
        new_w = new_w.min(best_w * self.config.w_growth_cap);
        // Capping can flip the turn direction
        if !is_stoppable(limits, min_dist, new_v, new_w) {
            return Revision::Rejected(Rejection::Unsafe);
        }

        let planned = predict_distance(min_dist, best_v, best_w, dt);
        let revised = predict_distance(min_dist, new_v, new_w, dt);
        debug!("Projected distance: planner {:.3}, case {:.3}", planned, revised);

        if revised < self.config.safety_floor {
            return Revision::Rejected(Rejection::TooClose);
        }
        if (revised - planned).abs() < self.config.stability_tolerance {
            return Revision::Rejected(Rejection::Marginal);
        }
        if revised < planned {
            Revision::Modified { v: new_v, w: new_w }
        } else {
            Revision::Rejected(Rejection::NoImprovement)
        }
    }

    /// Retrieve and revise for one cycle.
    /// A failing store read degrades to the planner's command.
    #[allow(clippy::too_many_arguments)]
    pub fn decide(
        &self,
        limits: &VehicleLimits,
        distance: f64,
        angle: f64,
        scenario: Scenario,
        best_v: f64,
        best_w: f64,
        dt: f64,
    ) -> DecisionOutcome {
        let planner = DecisionOutcome {
            chosen_v: best_v,
            chosen_w: best_w,
            label: CaseLabel::NewCase,
            matched_case: None,
        };

        let case = match self.retrieve(distance, angle, scenario) {
            Ok(Some(case)) => case,
            Ok(None) => {
                debug!("No similar case for {} at d={:.2}, angle={:.1}", scenario, distance, angle);
                return planner;
            }
            Err(err) => {
                warn!("Case retrieval failed, using planner command: {}", err);
                return planner;
            }
        };

        let tolerance = self.config.stability_tolerance;
        if (case.linear_velocity - best_v).abs() <= tolerance
            && (case.angular_velocity - best_w).abs() <= tolerance
        {
            return DecisionOutcome {
                label: CaseLabel::OldCase,
                matched_case: Some(case.id),
                ..planner
            };
        }

        match self.revise(limits, distance, best_v, best_w, case.linear_velocity, case.angular_velocity, dt) {
            Revision::Modified { v, w } => DecisionOutcome {
                chosen_v: v,
                chosen_w: w,
                label: CaseLabel::ModifiedCase,
                matched_case: Some(case.id),
            },
            Revision::Rejected(reason) => {
                debug!("Case {} rejected: {:?}", case.id, reason);
                DecisionOutcome {
                    matched_case: Some(case.id),
                    ..planner
                }
            }
        }
    }

    /// Stores the issued command when the label calls for a new case
    pub fn retain(
        &mut self,
        label: CaseLabel,
        distance: f64,
        angle: f64,
        scenario: Scenario,
        v: f64,
        w: f64,
    ) -> RetainStatus {
        if label != CaseLabel::NewCase {
            return RetainStatus::Skipped;
        }
        let case = NewCase {
            distance_to_obstacle: distance,
            bearing_angle: angle,
            scenario,
            linear_velocity: v,
            angular_velocity: w,
        };
        match self.store.append(case) {
            Ok(case) => {
                info!("Retained case {} ({} at d={:.2})", case.id, scenario, distance);
                RetainStatus::Stored(case.id)
            }
            Err(err) => {
                warn!("Failed to retain case: {}", err);
                RetainStatus::Failed(err.to_string())
            }
        }
    }
}
