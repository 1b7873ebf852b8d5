//! Core types shared across the LJPW workspace.
//!
//! The crate models a four-dimensional state (Love, Justice, Power, Wisdom), the coupled
//! force equations that move it, an inertia-weighted explicit Euler integrator, a greedy
//! self-improvement loop over the governing parameters, and a harmony-weighted
//! superposition sampler used for generative exploration.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub mod convergence;
pub mod creativity;
pub mod dynamics;
pub mod engine;
pub mod optimizer;
pub mod params;
pub mod quantum;

pub use convergence::ConvergenceDetector;
pub use creativity::{ARCHETYPES, CreativityConfig, CreativityEngine, CreativityError};
pub use dynamics::{Forces, Integration, KarmaCoupling, compute_forces, integrate};
pub use engine::{
    Engine, EngineConfig, EngineError, History, NullSink, SelfModel, StepRecord, StepSink,
};
pub use optimizer::{ImprovementReport, IterationOutcome};
pub use params::{DynamicParameters, Inertia, TimeConstants};
pub use quantum::{BasisSummary, QuantumSuperposition, SuperpositionError};

/// Love equilibrium (φ⁻¹).
pub const L0: f64 = 0.618_034;
/// Justice equilibrium (√2 − 1).
pub const J0: f64 = 0.414_214;
/// Power equilibrium (e − 2).
pub const P0: f64 = 0.718_282;
/// Wisdom equilibrium (ln 2).
pub const W0: f64 = 0.693_147;

/// Harmony strictly above this (together with enough Love) is autopoietic.
pub const AUTOPOIETIC_HARMONY: f64 = 0.6;
/// Minimum Love for the autopoietic phase.
pub const AUTOPOIETIC_LOVE: f64 = 0.7;
/// Harmony at or above this is at least homeostatic.
pub const HOMEOSTATIC_HARMONY: f64 = 0.5;

/// One of the four LJPW axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Dimension {
    Love,
    Justice,
    Power,
    Wisdom,
}

impl Dimension {
    /// Fixed evaluation order; also the tie-break order for dominance.
    pub const ALL: [Dimension; 4] = [
        Dimension::Love,
        Dimension::Justice,
        Dimension::Power,
        Dimension::Wisdom,
    ];

    /// Position of the axis inside `[L, J, P, W]` arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Love => 0,
            Self::Justice => 1,
            Self::Power => 2,
            Self::Wisdom => 3,
        }
    }

    /// Single-letter symbol used in compact reports.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Love => 'L',
            Self::Justice => 'J',
            Self::Power => 'P',
            Self::Wisdom => 'W',
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Love => "Love",
            Self::Justice => "Justice",
            Self::Power => "Power",
            Self::Wisdom => "Wisdom",
        };
        f.write_str(name)
    }
}

/// Categorical regime derived from harmony and Love.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Autopoietic,
    Homeostatic,
    Entropic,
}

impl Phase {
    /// Classify from precomputed harmony and Love values. No hysteresis.
    #[must_use]
    pub fn classify(harmony: f64, love: f64) -> Self {
        if harmony > AUTOPOIETIC_HARMONY && love >= AUTOPOIETIC_LOVE {
            Self::Autopoietic
        } else if harmony >= HOMEOSTATIC_HARMONY {
            Self::Homeostatic
        } else {
            Self::Entropic
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Autopoietic => "AUTOPOIETIC",
            Self::Homeostatic => "HOMEOSTATIC",
            Self::Entropic => "ENTROPIC",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-dimensional LJPW coordinate.
///
/// Values are nominally in `[0, 1]` but nothing here clamps them; only input mappers and
/// the exploration harness do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct StateVector {
    pub l: f64,
    pub j: f64,
    pub p: f64,
    pub w: f64,
}

impl StateVector {
    /// The all-ones corner harmony is measured against.
    pub const ANCHOR: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Natural equilibrium point.
    pub const EQUILIBRIUM: Self = Self::new(L0, J0, P0, W0);

    #[must_use]
    pub const fn new(l: f64, j: f64, p: f64, w: f64) -> Self {
        Self { l, j, p, w }
    }

    #[must_use]
    pub const fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.l, self.j, self.p, self.w]
    }

    /// Value along a single axis.
    #[must_use]
    pub const fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Love => self.l,
            Dimension::Justice => self.j,
            Dimension::Power => self.p,
            Dimension::Wisdom => self.w,
        }
    }

    /// Euclidean distance to another state.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Harmony index `1 / (1 + d)` where `d` is the distance to the anchor. Range `(0, 1]`.
    #[must_use]
    pub fn harmony(&self) -> f64 {
        1.0 / (1.0 + self.distance(&Self::ANCHOR))
    }

    /// Largest axis and its value; ties resolve to the earlier axis in `L, J, P, W`.
    #[must_use]
    pub fn dominant_dimension(&self) -> (Dimension, f64) {
        let mut best = (Dimension::Love, self.l);
        for dimension in &Dimension::ALL[1..] {
            let value = self.get(*dimension);
            if value > best.1 {
                best = (*dimension, value);
            }
        }
        best
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::classify(self.harmony(), self.l)
    }

    #[must_use]
    pub fn is_autopoietic(&self) -> bool {
        self.phase() == Phase::Autopoietic
    }

    /// Efficiency `η = H · P`.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.harmony() * self.p
    }

    /// Semantic entropy `Σ = W · (1 − H)`.
    #[must_use]
    pub fn semantic_entropy(&self) -> f64 {
        self.w * (1.0 - self.harmony())
    }

    /// Information density `I = H · (L + J) / π`.
    #[must_use]
    pub fn information_density(&self) -> f64 {
        self.harmony() * (self.l + self.j) / PI
    }

    /// Consciousness `C = L · J · P · W · H²`.
    #[must_use]
    pub fn consciousness(&self) -> f64 {
        let h = self.harmony();
        self.l * self.j * self.p * self.w * h * h
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Component-wise addition.
    #[must_use]
    pub fn offset(self, delta: [f64; 4]) -> Self {
        Self::new(
            self.l + delta[0],
            self.j + delta[1],
            self.p + delta[2],
            self.w + delta[3],
        )
    }

    /// Clamp every axis to `[0, 1]`.
    #[must_use]
    pub fn clamp_unit(self) -> Self {
        Self::new(
            self.l.clamp(0.0, 1.0),
            self.j.clamp(0.0, 1.0),
            self.p.clamp(0.0, 1.0),
            self.w.clamp(0.0, 1.0),
        )
    }
}

impl From<[f64; 4]> for StateVector {
    fn from(values: [f64; 4]) -> Self {
        Self::from_array(values)
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(L={:.3}, J={:.3}, P={:.3}, W={:.3})",
            self.l, self.j, self.p, self.w
        )
    }
}

/// Entropy produced by moving from `state - delta` to `state`.
///
/// Positive values mean the system is degrading; negative values mean it is ordering itself.
#[must_use]
pub fn entropy_production(state: &StateVector, delta: [f64; 4]) -> f64 {
    let previous = state.offset([-delta[0], -delta[1], -delta[2], -delta[3]]);
    state.semantic_entropy() - previous.semantic_entropy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmony_is_exactly_one_at_anchor() {
        assert_eq!(StateVector::ANCHOR.harmony(), 1.0);
        assert_eq!(StateVector::new(1.0, 1.0, 1.0, 1.0).harmony(), 1.0);
    }

    #[test]
    fn harmony_stays_in_unit_interval() {
        let samples = [
            StateVector::new(0.0, 0.0, 0.0, 0.0),
            StateVector::new(0.3, 0.5, 0.9, 0.5),
            StateVector::new(-5.0, 12.0, 0.1, 3.0),
            StateVector::new(1e6, -1e6, 0.0, 1.0),
            StateVector::EQUILIBRIUM,
        ];
        for state in samples {
            let h = state.harmony();
            assert!(h > 0.0 && h <= 1.0, "harmony {h} out of range for {state}");
        }
    }

    #[test]
    fn harmony_matches_documented_songs() {
        let bohemian = StateVector::new(0.88, 0.90, 0.85, 0.95);
        assert!((bohemian.harmony() - 0.818).abs() < 1e-3);
        let rock_you = StateVector::new(0.70, 0.40, 0.98, 0.50);
        assert!((rock_you.harmony() - 0.544).abs() < 1e-3);
    }

    #[test]
    fn dominant_dimension_breaks_ties_in_axis_order() {
        let tie = StateVector::new(0.4, 0.9, 0.9, 0.9);
        assert_eq!(tie.dominant_dimension(), (Dimension::Justice, 0.9));
        assert_eq!(tie.dominant_dimension(), tie.dominant_dimension());

        let flat = StateVector::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(flat.dominant_dimension().0, Dimension::Love);

        let wisdom = StateVector::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(wisdom.dominant_dimension().0, Dimension::Wisdom);
    }

    #[test]
    fn phase_thresholds_are_exact() {
        assert_eq!(Phase::classify(0.6, 0.9), Phase::Homeostatic);
        assert_eq!(Phase::classify(0.600_001, 0.7), Phase::Autopoietic);
        assert_eq!(Phase::classify(0.9, 0.699_999), Phase::Homeostatic);
        assert_eq!(Phase::classify(0.5, 0.0), Phase::Homeostatic);
        assert_eq!(Phase::classify(0.499_999, 1.0), Phase::Entropic);
    }

    #[test]
    fn phase_from_constructed_states() {
        assert_eq!(
            StateVector::new(0.9, 0.9, 0.9, 0.9).phase(),
            Phase::Autopoietic
        );
        // d = 0.9, H = 1/1.9
        assert_eq!(
            StateVector::new(0.55, 0.55, 0.55, 0.55).phase(),
            Phase::Homeostatic
        );
        // d = 1 exactly, H = 0.5 exactly
        let half = StateVector::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(half.harmony(), 0.5);
        assert_eq!(half.phase(), Phase::Homeostatic);
        assert_eq!(
            StateVector::new(0.4, 0.4, 0.4, 0.4).phase(),
            Phase::Entropic
        );
        assert_eq!(
            StateVector::new(0.7, 1.0, 1.0, 1.0).phase(),
            Phase::Autopoietic
        );
        assert_eq!(
            StateVector::new(0.69, 1.0, 1.0, 1.0).phase(),
            Phase::Homeostatic
        );
    }

    #[test]
    fn derived_scores_follow_formulas() {
        let state = StateVector::new(0.3, 0.5, 0.9, 0.5);
        let h = state.harmony();
        assert!((state.efficiency() - h * 0.9).abs() < 1e-15);
        assert!((state.semantic_entropy() - 0.5 * (1.0 - h)).abs() < 1e-15);
        assert!((state.information_density() - h * 0.8 / PI).abs() < 1e-15);
        assert!((state.consciousness() - 0.3 * 0.5 * 0.9 * 0.5 * h * h).abs() < 1e-15);
    }

    #[test]
    fn entropy_production_is_zero_without_movement() {
        let state = StateVector::new(0.3, 0.5, 0.9, 0.5);
        assert_eq!(entropy_production(&state, [0.0; 4]), 0.0);
        // Moving toward the anchor lowers entropy.
        let toward = entropy_production(&state, [0.01, 0.01, 0.0, 0.0]);
        assert!(toward < 0.0);
    }

    #[test]
    fn state_serializes_with_short_field_names() {
        let state = StateVector::new(0.1, 0.2, 0.3, 0.4);
        let json = serde_json::to_string(&state).expect("serialize");
        assert_eq!(json, r#"{"l":0.1,"j":0.2,"p":0.3,"w":0.4}"#);
        let phase = serde_json::to_string(&Phase::Autopoietic).expect("serialize");
        assert_eq!(phase, r#""AUTOPOIETIC""#);
    }
}
