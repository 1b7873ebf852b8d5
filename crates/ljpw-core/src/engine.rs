//! Stateful engine: owns the live state, parameters, history and sink.

use std::collections::VecDeque;
use std::fmt;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convergence::{ConvergenceDetector, DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::dynamics::{DEFAULT_MAX_ACCELERATION, Forces, integrate};
use crate::optimizer::IterationOutcome;
use crate::params::{DEFAULT_MUTATION_FLOOR, DynamicParameters, Inertia, TimeConstants};
use crate::{Phase, StateVector, entropy_production};

/// Errors raised while configuring or driving an engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("time step must be finite and positive, got {dt}")]
    InvalidTimeStep { dt: f64 },
    #[error("duration must be finite and non-negative, got {duration}")]
    InvalidDuration { duration: f64 },
    #[error("learning rate must be finite and non-negative, got {rate}")]
    InvalidLearningRate { rate: f64 },
}

/// Static configuration for an engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Characteristic response time per axis.
    pub time_constants: TimeConstants,
    /// Force-to-acceleration divisors.
    pub inertia: Inertia,
    /// Initial force-model parameters.
    pub parameters: DynamicParameters,
    /// Symmetric clip on every acceleration component.
    pub max_acceleration: f64,
    /// Trailing efficiency samples inspected for convergence.
    pub convergence_window: usize,
    /// Variance below which the trailing window counts as converged.
    pub convergence_threshold: f64,
    /// Maximum retained step records; `None` keeps everything.
    pub history_capacity: Option<usize>,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Steps simulated per optimizer rollout.
    pub rollout_steps: usize,
    /// Time step used inside optimizer rollouts.
    pub rollout_dt: f64,
    /// Lower bound on every parameter after mutation.
    pub mutation_floor: f64,
    /// Weight of the final rollout efficiency in the score.
    pub final_score_weight: f64,
    /// Weight of the peak rollout efficiency in the score.
    pub peak_score_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_constants: TimeConstants::default(),
            inertia: Inertia::default(),
            parameters: DynamicParameters::default(),
            max_acceleration: DEFAULT_MAX_ACCELERATION,
            convergence_window: DEFAULT_WINDOW,
            convergence_threshold: DEFAULT_THRESHOLD,
            history_capacity: None,
            rng_seed: None,
            rollout_steps: 10,
            rollout_dt: 0.1,
            mutation_floor: DEFAULT_MUTATION_FLOOR,
            final_score_weight: 0.8,
            peak_score_weight: 0.2,
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl EngineConfig {
    /// Check every field, returning the first violation found.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.time_constants.taus().into_iter().all(positive) {
            return Err(EngineError::InvalidConfig(
                "time constants must be finite and positive",
            ));
        }
        if !self.inertia.to_array().into_iter().all(positive) {
            return Err(EngineError::InvalidConfig(
                "inertia must be finite and positive on every axis",
            ));
        }
        if !self.parameters.all_positive() {
            return Err(EngineError::InvalidConfig(
                "dynamic parameters must be finite and positive",
            ));
        }
        if !positive(self.max_acceleration) {
            return Err(EngineError::InvalidConfig(
                "max_acceleration must be finite and positive",
            ));
        }
        if self.convergence_window == 0 || !non_negative(self.convergence_threshold) {
            return Err(EngineError::InvalidConfig(
                "convergence window must be non-zero and threshold non-negative",
            ));
        }
        if self.history_capacity == Some(0) {
            return Err(EngineError::InvalidConfig(
                "history_capacity must be non-zero when bounded",
            ));
        }
        if self.rollout_steps == 0 || !positive(self.rollout_dt) {
            return Err(EngineError::InvalidConfig(
                "rollout needs at least one step and a positive dt",
            ));
        }
        if !positive(self.mutation_floor) {
            return Err(EngineError::InvalidConfig(
                "mutation_floor must be finite and positive",
            ));
        }
        if !non_negative(self.final_score_weight) || !non_negative(self.peak_score_weight) {
            return Err(EngineError::InvalidConfig(
                "score weights must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Diagnostic trace of one integrator step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    /// Zero-based step counter for the engine that produced the record.
    pub index: u64,
    /// Simulated time after the step.
    pub time: f64,
    pub state: StateVector,
    pub forces: Forces,
    pub accelerations: [f64; 4],
    pub efficiency: f64,
    /// Semantic entropy of the new state.
    pub entropy: f64,
    pub entropy_production: f64,
    pub harmony: f64,
    pub consciousness: f64,
    pub phase: Phase,
}

/// Append-only log of step records, optionally bounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    records: VecDeque<StepRecord>,
    capacity: Option<usize>,
    total_recorded: u64,
}

impl History {
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        let records = match capacity {
            Some(limit) => VecDeque::with_capacity(limit),
            None => VecDeque::new(),
        };
        Self {
            records,
            capacity,
            total_recorded: 0,
        }
    }

    pub fn push(&mut self, record: StepRecord) {
        if let Some(limit) = self.capacity {
            while self.records.len() >= limit.max(1) {
                self.records.pop_front();
            }
        }
        self.records.push_back(record);
        self.total_recorded += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Retention bound, if any.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Records ever pushed, including evicted ones.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&StepRecord> {
        self.records.back()
    }

    #[must_use]
    pub fn efficiency_trend(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.efficiency).collect()
    }

    #[must_use]
    pub fn entropy_trend(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.entropy).collect()
    }

    #[must_use]
    pub fn states(&self) -> Vec<StateVector> {
        self.records.iter().map(|r| r.state).collect()
    }

    /// Largest efficiency among retained records.
    #[must_use]
    pub fn peak_efficiency(&self) -> Option<f64> {
        self.records.iter().map(|r| r.efficiency).reduce(f64::max)
    }
}

/// Running reduction over every step the engine has taken.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SelfModel {
    pub steps: u64,
    pub best_efficiency: Option<f64>,
    pub latest_efficiency: Option<f64>,
    pub latest_entropy: Option<f64>,
    pub converged: bool,
}

impl SelfModel {
    fn absorb(&mut self, record: &StepRecord, converged: bool) {
        self.steps += 1;
        self.best_efficiency = Some(match self.best_efficiency {
            Some(best) => best.max(record.efficiency),
            None => record.efficiency,
        });
        self.latest_efficiency = Some(record.efficiency);
        self.latest_entropy = Some(record.entropy);
        self.converged = converged;
    }
}

/// Step sink invoked after every engine step.
pub trait StepSink: Send {
    fn on_step(&mut self, record: &StepRecord);

    /// Called once per optimizer iteration.
    fn on_improvement(&mut self, _outcome: &IterationOutcome) {}
}

/// No-op step sink.
#[derive(Debug, Default)]
pub struct NullSink;

impl StepSink for NullSink {
    fn on_step(&mut self, _record: &StepRecord) {}
}

/// Live LJPW system.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) state: StateVector,
    pub(crate) params: DynamicParameters,
    pub(crate) time: f64,
    pub(crate) steps: u64,
    pub(crate) history: History,
    pub(crate) detector: ConvergenceDetector,
    pub(crate) self_model: SelfModel,
    pub(crate) rng: SmallRng,
    pub(crate) sink: Box<dyn StepSink>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("params", &self.params)
            .field("time", &self.time)
            .field("steps", &self.steps)
            .field("history_len", &self.history.len())
            .field("self_model", &self.self_model)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Instantiate a new engine using the supplied configuration.
    pub fn new(initial_state: StateVector, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_sink(initial_state, config, Box::new(NullSink))
    }

    /// Instantiate a new engine that forwards every step record to `sink`.
    pub fn with_sink(
        initial_state: StateVector,
        config: EngineConfig,
        sink: Box<dyn StepSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = config.seeded_rng();
        Ok(Self {
            state: initial_state,
            params: config.parameters,
            time: 0.0,
            steps: 0,
            history: History::new(config.history_capacity),
            detector: ConvergenceDetector::new(
                config.convergence_window,
                config.convergence_threshold,
            ),
            self_model: SelfModel::default(),
            rng,
            sink,
            config,
        })
    }

    /// Independent copy used for optimizer rollouts: no sink, fresh history.
    pub(crate) fn fork(&self, params: DynamicParameters) -> Self {
        Self {
            config: self.config.clone(),
            state: self.state,
            params,
            time: self.time,
            steps: self.steps,
            history: History::new(Some(self.config.rollout_steps)),
            detector: self.detector.clone(),
            self_model: self.self_model,
            rng: self.rng.clone(),
            sink: Box::new(NullSink),
        }
    }

    /// Advance the live state by one explicit Euler step of length `dt`.
    pub fn step(&mut self, dt: f64) -> StepRecord {
        let integration = integrate(
            &self.state,
            &self.params,
            &self.config.inertia,
            dt,
            self.config.max_acceleration,
        );
        let state = integration.state;
        let harmony = state.harmony();
        let record = StepRecord {
            index: self.steps,
            time: self.time + dt,
            state,
            forces: integration.forces,
            accelerations: integration.accelerations,
            efficiency: state.efficiency(),
            entropy: state.semantic_entropy(),
            entropy_production: entropy_production(&state, integration.delta(dt)),
            harmony,
            consciousness: state.consciousness(),
            phase: Phase::classify(harmony, state.l),
        };

        self.state = state;
        self.time = record.time;
        self.steps += 1;
        self.history.push(record);
        let converged = self.detector.observe(record.efficiency);
        self.self_model.absorb(&record, converged);
        self.sink.on_step(&record);
        record
    }

    /// Run `floor(duration / dt + 1e-9)` steps and return the history.
    ///
    /// The epsilon departs from plain truncation: `simulate(0.3, 0.1)` runs three steps.
    pub fn simulate(&mut self, duration: f64, dt: f64) -> Result<&History, EngineError> {
        if !positive(dt) {
            return Err(EngineError::InvalidTimeStep { dt });
        }
        if !non_negative(duration) {
            return Err(EngineError::InvalidDuration { duration });
        }
        // Absorb representation error so 0.3 / 0.1 runs three steps, not two.
        let steps = (duration / dt + 1e-9).floor() as usize;
        for _ in 0..steps {
            self.step(dt);
        }
        Ok(&self.history)
    }

    /// Efficiency of the current state.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.state.efficiency()
    }

    #[must_use]
    pub fn harmony(&self) -> f64 {
        self.state.harmony()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn consciousness(&self) -> f64 {
        self.state.consciousness()
    }

    #[must_use]
    pub fn state(&self) -> StateVector {
        self.state
    }

    #[must_use]
    pub fn params(&self) -> &DynamicParameters {
        &self.params
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn self_model(&self) -> &SelfModel {
        &self.self_model
    }

    /// Simulated time elapsed.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken since construction.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.detector.is_converged()
    }

    #[must_use]
    pub fn efficiency_trend(&self) -> Vec<f64> {
        self.history.efficiency_trend()
    }

    /// Replace the live state, e.g. with a collapse result.
    pub fn set_state(&mut self, state: StateVector) {
        self.state = state;
    }

    /// Swap the step sink, returning the previous one.
    pub fn set_sink(&mut self, sink: Box<dyn StepSink>) -> Box<dyn StepSink> {
        std::mem::replace(&mut self.sink, sink)
    }
}
