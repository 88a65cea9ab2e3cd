// core/mod.rs

// Declares the decision-core submodules and the per-cycle orchestrator that
// sequences scenario classification, fuzzy weighting, dynamic-window planning
// and case-based revision once per sensor cycle.

pub mod localization;
pub mod perception;
pub mod scenario;
pub mod state;

pub use localization::{KinematicState, VehicleLimits};
pub use perception::{Cone, ConeReading, PerceptionConfig, Proximity, RangeProfile};
pub use scenario::{ClassifierConfig, ClassifierSession, Scenario};
pub use state::{AvoidanceState, Mode, Transition};

use log::{debug, info};

use crate::VigilConfig;
use crate::cbr::{CaseLabel, CaseStore, CbrEngine, RetainStatus};
use crate::fuzzy::{FuzzyEngine, FuzzyWeights};
use crate::navigation::{CommandGate, DwaPlanner, VelocityCommand};

/// Inputs of one decision cycle, immutable for its duration
#[derive(Debug, Clone)]
pub struct CycleInput {
    /// Smoothed range profile
    pub profile: RangeProfile,
    /// Vehicle state and limits
    pub state: KinematicState,
    /// Goal bearing in the vehicle frame (degrees)
    pub goal_bearing_degrees: f64,
    /// Monotonic timestamp (seconds)
    pub timestamp: f64,
    /// Planning horizon and minimum command interval (seconds)
    pub dt: f64,
}

/// Why an avoiding cycle emitted nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// Profile carried no samples
    NoProfile,
    /// Classifier produced no scenario (seed cycle or no cluster)
    NoScenario,
    /// Less than `dt` since the last command
    RateLimited,
    /// Obstacle left the trigger distance but release conditions are not met yet
    Clearing,
}

/// Everything decided in a commanding cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReport {
    /// Command handed to the vehicle, clamped to its limits
    pub command: VelocityCommand,
    /// Planner proposal before case revision
    pub planned: VelocityCommand,
    /// CBR outcome
    pub label: CaseLabel,
    /// Id of the retrieved case, if any
    pub matched_case: Option<u64>,
    /// Scenario of the cycle
    pub scenario: Scenario,
    /// Closest obstacle distance of the selected cone
    pub obstacle_distance: f64,
    /// Bearing of that obstacle (degrees)
    pub obstacle_angle_deg: f64,
    /// Weights used by the planner
    pub weights: FuzzyWeights,
    /// Whether the decision was remembered
    pub retain: RetainStatus,
}

/// Result of one decision cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Not avoiding; external navigation stays in control
    Idle,
    /// Avoiding but nothing new to send; keep the previous command
    Hold(HoldReason),
    /// New velocity command
    Command(Box<CommandReport>),
    /// Avoidance finished; external navigation resumes
    Released,
}

/// Decision core of one vehicle.
/// Cycles must be run strictly in order; the classifier baseline, the command
/// gate and the case store carry state from one cycle to the next.
#[derive(Debug)]
pub struct AvoidanceCore<S> {
    config: VigilConfig,
    classifier: ClassifierSession,
    fuzzy: FuzzyEngine,
    planner: DwaPlanner,
    cbr: CbrEngine<S>,
    gate: CommandGate,
    state: AvoidanceState,
}

impl<S: CaseStore> AvoidanceCore<S> {
    /// Builds the core around a case store
    pub fn new(config: VigilConfig, store: S) -> Self {
        AvoidanceCore {
            classifier: ClassifierSession::new(config.classifier),
            fuzzy: FuzzyEngine::new(config.fuzzy),
            planner: DwaPlanner::new(config.navigation),
            cbr: CbrEngine::new(store, config.cbr),
            gate: CommandGate::new(),
            state: AvoidanceState::new(),
            config,
        }
    }

    /// Runs one decision cycle
    pub fn run_cycle(&mut self, input: &CycleInput) -> CycleOutcome {
        // Classification runs every cycle to keep the baseline current
        let scenario = self
            .classifier
            .classify(&input.profile, input.state.v, input.timestamp);
        debug!("t={:.3} scenario {:?}", input.timestamp, scenario);

        let Some(proximity) = Proximity::assess(&input.profile, &self.config.perception) else {
            return match self.state.mode() {
                Mode::Avoiding => CycleOutcome::Hold(HoldReason::NoProfile),
                Mode::Idle => CycleOutcome::Idle,
            };
        };

        let release_interval = self.config.navigation.release_factor * input.dt;
        let quiet = self.gate.quiet_for(input.timestamp, release_interval);
        match self.state.update(&proximity, &self.config.perception, quiet) {
            Transition::Released => return CycleOutcome::Released,
            Transition::Engaged | Transition::Unchanged => {}
        }

        if !proximity.is_triggered() {
            return match self.state.mode() {
                Mode::Avoiding => CycleOutcome::Hold(HoldReason::Clearing),
                Mode::Idle => CycleOutcome::Idle,
            };
        }

        let Some(scenario) = scenario else {
            return CycleOutcome::Hold(HoldReason::NoScenario);
        };
        self.avoid(input, &proximity, scenario)
    }

    fn avoid(&mut self, input: &CycleInput, proximity: &Proximity, scenario: Scenario) -> CycleOutcome {
        let closest = proximity.closest();
        let angle = closest.bearing_degrees();

        let weights = self.fuzzy.infer(closest.distance, angle);
        let plan = self
            .planner
            .plan(&input.state, &input.profile, input.goal_bearing_degrees, input.dt, &weights);
        debug!(
            "Weights alpha={:.3} beta={:.3} gamma={:.3}, planner v={:.3} w={:.3}",
            weights.alpha, weights.beta, weights.gamma, plan.v, plan.w
        );

        if !self.gate.is_open(input.timestamp, input.dt) {
            return CycleOutcome::Hold(HoldReason::RateLimited);
        }

        let elapsed = self.gate.elapsed(input.timestamp).unwrap_or(input.dt);
        let limits = input.state.limits;
        let decision = self
            .cbr
            .decide(&limits, closest.distance, angle, scenario, plan.v, plan.w, elapsed);
        let (v, w) = limits.clamp(decision.chosen_v, decision.chosen_w);
        self.gate.record(input.timestamp);

        info!(
            "{} at {:.2} ({:.1} deg): v={:.3} w={:.3} [{}]",
            scenario, closest.distance, angle, v, w, decision.label
        );
        let retain = self
            .cbr
            .retain(decision.label, closest.distance, angle, scenario, v, w);

        CycleOutcome::Command(Box::new(CommandReport {
            command: VelocityCommand::new(v, w),
            planned: VelocityCommand::new(plan.v, plan.w),
            label: decision.label,
            matched_case: decision.matched_case,
            scenario,
            obstacle_distance: closest.distance,
            obstacle_angle_deg: angle,
            weights,
            retain,
        }))
    }

    /// Drops the classifier baseline and the avoidance mode.
    /// The case store is kept.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.state.reset();
        self.gate = CommandGate::new();
    }

    /// Current avoidance mode
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Configuration in use
    pub fn config(&self) -> &VigilConfig {
        &self.config
    }

    /// CBR engine and its store
    pub fn cbr(&self) -> &CbrEngine<S> {
        &self.cbr
    }
}
