//! Weighted candidate sampling over complex amplitudes.

use num_complex::Complex64;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StateVector;

/// Errors raised when building a superposition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuperpositionError {
    #[error("amplitude count {amplitudes} does not match state count {states}")]
    LengthMismatch { amplitudes: usize, states: usize },
    #[error("superposition needs at least one basis state")]
    Empty,
    #[error("amplitude {index} is not finite")]
    NonFiniteAmplitude { index: usize },
}

/// Per-basis breakdown of a superposition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BasisSummary {
    pub index: usize,
    pub state: StateVector,
    pub amplitude: Complex64,
    /// Born probability `|a|²`.
    pub probability: f64,
    pub phase_degrees: f64,
    pub harmony: f64,
    /// `|a|² · H` renormalized over all bases.
    pub weighted_probability: f64,
}

/// Index-aligned amplitudes and basis states.
///
/// Amplitudes are normalized on construction so that `Σ|a|² = 1` whenever any amplitude
/// is non-zero. An all-zero input stays all-zero and collapses uniformly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantumSuperposition {
    amplitudes: Vec<Complex64>,
    states: Vec<StateVector>,
}

impl QuantumSuperposition {
    pub fn new(
        amplitudes: Vec<Complex64>,
        states: Vec<StateVector>,
    ) -> Result<Self, SuperpositionError> {
        if amplitudes.len() != states.len() {
            return Err(SuperpositionError::LengthMismatch {
                amplitudes: amplitudes.len(),
                states: states.len(),
            });
        }
        if amplitudes.is_empty() {
            return Err(SuperpositionError::Empty);
        }
        if let Some(index) = amplitudes.iter().position(|a| !a.is_finite()) {
            return Err(SuperpositionError::NonFiniteAmplitude { index });
        }
        let mut superposition = Self { amplitudes, states };
        superposition.normalize();
        Ok(superposition)
    }

    fn normalize(&mut self) {
        // Pre-scale by the largest magnitude so the squared sum cannot overflow.
        let scale = self
            .amplitudes
            .iter()
            .map(|a| a.norm())
            .fold(0.0_f64, f64::max);
        if scale <= 0.0 || !scale.is_finite() {
            return;
        }
        for amplitude in &mut self.amplitudes {
            *amplitude /= scale;
        }
        let norm = self
            .amplitudes
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt();
        for amplitude in &mut self.amplitudes {
            *amplitude /= norm;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false for a constructed superposition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    #[must_use]
    pub fn basis(&self) -> &[StateVector] {
        &self.states
    }

    /// Born probabilities `|a_i|²`.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Shannon entropy of the probabilities divided by `ln n`, in `[0, 1]`.
    ///
    /// A single-basis superposition has nothing to be uncertain about and reports 0.
    #[must_use]
    pub fn entanglement_entropy(&self) -> f64 {
        let n = self.amplitudes.len();
        if n < 2 {
            return 0.0;
        }
        let entropy: f64 = self
            .probabilities()
            .into_iter()
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.ln())
            .sum();
        (entropy / (n as f64).ln()).clamp(0.0, 1.0)
    }

    /// Collapse weights `|a_i|² · H_i` (or `|a_i|²` alone when not harmony-weighted).
    #[must_use]
    pub fn weights(&self, harmony_weighted: bool) -> Vec<f64> {
        self.amplitudes
            .iter()
            .zip(&self.states)
            .map(|(amplitude, state)| {
                let probability = amplitude.norm_sqr();
                if harmony_weighted {
                    probability * state.harmony()
                } else {
                    probability
                }
            })
            .collect()
    }

    /// Sample a basis index. Degenerate weights fall back to a uniform choice.
    pub fn collapse_index<R: Rng + ?Sized>(&self, harmony_weighted: bool, rng: &mut R) -> usize {
        match WeightedIndex::new(self.weights(harmony_weighted)) {
            Ok(distribution) => distribution.sample(rng),
            Err(_) => rng.random_range(0..self.states.len()),
        }
    }

    /// Sample one basis state. Read-only: the superposition is left intact.
    pub fn collapse<R: Rng + ?Sized>(&self, harmony_weighted: bool, rng: &mut R) -> StateVector {
        self.states[self.collapse_index(harmony_weighted, rng)]
    }

    /// Structured view of every basis: amplitude, probability, phase and harmony.
    #[must_use]
    pub fn describe(&self) -> Vec<BasisSummary> {
        let weights = self.weights(true);
        let total: f64 = weights.iter().sum();
        self.amplitudes
            .iter()
            .zip(&self.states)
            .zip(weights)
            .enumerate()
            .map(|(index, ((amplitude, state), weight))| BasisSummary {
                index,
                state: *state,
                amplitude: *amplitude,
                probability: amplitude.norm_sqr(),
                phase_degrees: amplitude.arg().to_degrees(),
                harmony: state.harmony(),
                weighted_probability: if total > 0.0 { weight / total } else { 0.0 },
            })
            .collect()
    }
}
