//! Stateful exploration harness built on repeated superposition and collapse.

use std::ops::RangeInclusive;

use num_complex::Complex64;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantum::{QuantumSuperposition, SuperpositionError};
use crate::{Dimension, StateVector};

/// Basis states cycled through by [`CreativityEngine::high_entropy_superposition`].
pub const ARCHETYPES: [(Dimension, StateVector); 4] = [
    (Dimension::Love, StateVector::new(0.95, 0.60, 0.55, 0.60)),
    (Dimension::Justice, StateVector::new(0.60, 0.95, 0.60, 0.80)),
    (Dimension::Power, StateVector::new(0.55, 0.70, 0.95, 0.60)),
    (Dimension::Wisdom, StateVector::new(0.65, 0.75, 0.70, 0.95)),
];

/// Starting point for an exploration with no prior state.
pub const DEFAULT_EXPLORATION_START: StateVector = StateVector::new(0.5, 0.5, 0.5, 0.5);

#[derive(Debug, Error, PartialEq)]
pub enum CreativityError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Superposition(#[from] SuperpositionError),
}

/// Tunables for [`CreativityEngine`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreativityConfig {
    /// Candidates generated per exploration round.
    pub candidates: usize,
    /// Maximum per-axis offset from the current state.
    pub spread: f64,
    /// Range of the real amplitude part before normalization.
    pub amplitude_range: RangeInclusive<f64>,
    /// Maximum magnitude of the imaginary amplitude part.
    pub phase_jitter: f64,
    /// Optional RNG seed for reproducible explorations.
    pub rng_seed: Option<u64>,
}

impl Default for CreativityConfig {
    fn default() -> Self {
        Self {
            candidates: 5,
            spread: 0.2,
            amplitude_range: 0.5..=1.0,
            phase_jitter: 0.2,
            rng_seed: None,
        }
    }
}

impl CreativityConfig {
    pub fn validate(&self) -> Result<(), CreativityError> {
        if self.candidates == 0 {
            return Err(CreativityError::InvalidConfig(
                "candidates must be non-zero",
            ));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(CreativityError::InvalidConfig(
                "spread must be finite and non-negative",
            ));
        }
        let (low, high) = (*self.amplitude_range.start(), *self.amplitude_range.end());
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || low > high {
            return Err(CreativityError::InvalidConfig(
                "amplitude range must be positive and ordered",
            ));
        }
        if !self.phase_jitter.is_finite() || self.phase_jitter < 0.0 {
            return Err(CreativityError::InvalidConfig(
                "phase_jitter must be finite and non-negative",
            ));
        }
        Ok(())
    }

    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Repeated superposition-and-collapse walker.
///
/// Remembers the last collapsed state so successive explorations continue one walk.
#[derive(Debug, Clone)]
pub struct CreativityEngine {
    config: CreativityConfig,
    rng: SmallRng,
    current: Option<StateVector>,
}

impl CreativityEngine {
    pub fn new(config: CreativityConfig) -> Result<Self, CreativityError> {
        config.validate()?;
        let rng = config.seeded_rng();
        Ok(Self {
            config,
            rng,
            current: None,
        })
    }

    /// Equal-amplitude superposition over `n` bases cycling through [`ARCHETYPES`].
    pub fn high_entropy_superposition(
        n: usize,
    ) -> Result<QuantumSuperposition, SuperpositionError> {
        let amplitude = Complex64::new(1.0 / (n.max(1) as f64).sqrt(), 0.0);
        let states = ARCHETYPES
            .iter()
            .cycle()
            .take(n)
            .map(|(_, state)| *state)
            .collect();
        QuantumSuperposition::new(vec![amplitude; n], states)
    }

    /// Superposition of jittered neighbours of `center`, clamped to the unit cube.
    pub fn neighbourhood(
        &mut self,
        center: StateVector,
    ) -> Result<QuantumSuperposition, SuperpositionError> {
        let spread = self.config.spread;
        let count = self.config.candidates;
        let states: Vec<StateVector> = (0..count)
            .map(|_| {
                let offset = [(); 4].map(|_| self.rng.random_range(-spread..=spread));
                center.offset(offset).clamp_unit()
            })
            .collect();

        let real: Vec<f64> = (0..count)
            .map(|_| self.rng.random_range(self.config.amplitude_range.clone()))
            .collect();
        let norm = real.iter().map(|a| a * a).sum::<f64>().sqrt();
        let jitter = self.config.phase_jitter;
        let amplitudes = real
            .into_iter()
            .map(|a| Complex64::new(a / norm, self.rng.random_range(-jitter..=jitter)))
            .collect();
        QuantumSuperposition::new(amplitudes, states)
    }

    /// Run `iterations` rounds of neighbourhood collapse and return the collapsed states.
    ///
    /// `start` overrides the remembered state; with neither, the walk begins at
    /// [`DEFAULT_EXPLORATION_START`].
    pub fn iterative_exploration(
        &mut self,
        start: Option<StateVector>,
        iterations: usize,
    ) -> Result<Vec<StateVector>, CreativityError> {
        let mut current = start
            .or(self.current)
            .unwrap_or(DEFAULT_EXPLORATION_START);
        let mut trajectory = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let psi = self.neighbourhood(current)?;
            current = psi.collapse(true, &mut self.rng);
            trajectory.push(current);
        }
        self.current = Some(current);
        Ok(trajectory)
    }

    /// Last collapsed state, if any exploration has run.
    #[must_use]
    pub fn current_state(&self) -> Option<StateVector> {
        self.current
    }

    #[must_use]
    pub fn config(&self) -> &CreativityConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}
