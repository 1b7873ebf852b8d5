//! Force equations and the inertia-weighted explicit Euler integrator.
//!
//! Everything in this module is pure: identical inputs produce bit-identical outputs.

use serde::{Deserialize, Serialize};

use crate::params::{DynamicParameters, Inertia};
use crate::{StateVector, W0};

/// Default symmetric bound applied to each acceleration component.
pub const DEFAULT_MAX_ACCELERATION: f64 = 0.05;

/// Harmony-dependent multipliers on the Love couplings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KarmaCoupling {
    pub love_justice: f64,
    pub love_power: f64,
    pub love_wisdom: f64,
}

impl KarmaCoupling {
    const LOVE_JUSTICE: f64 = 0.4;
    const LOVE_POWER: f64 = 0.3;
    const LOVE_WISDOM: f64 = 0.5;

    #[must_use]
    pub fn from_harmony(harmony: f64) -> Self {
        Self {
            love_justice: 1.0 + Self::LOVE_JUSTICE * harmony,
            love_power: 1.0 + Self::LOVE_POWER * harmony,
            love_wisdom: 1.0 + Self::LOVE_WISDOM * harmony,
        }
    }
}

/// Instantaneous rates of change `(dL, dJ, dP, dW)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Forces {
    pub love: f64,
    pub justice: f64,
    pub power: f64,
    pub wisdom: f64,
}

impl Forces {
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.love, self.justice, self.power, self.wisdom]
    }
}

/// Evaluate the coupled force equations at `state`.
///
/// `K_JL + L` is assumed positive; with a positive `k_jl` that holds for any non-negative Love.
#[must_use]
pub fn compute_forces(state: &StateVector, params: &DynamicParameters) -> Forces {
    let StateVector { l, j, p, w } = *state;
    let kappa = KarmaCoupling::from_harmony(state.harmony());

    let love = params.alpha_lj * j * kappa.love_justice + params.alpha_lw * w * kappa.love_wisdom
        - params.beta_l * l;

    // Power corrupts Justice while Wisdom sits below its equilibrium.
    let erosion = params.gamma * p * (1.0 - w / W0);
    let justice = params.alpha_jl * (l / (params.k_jl + l)) + params.alpha_jw * w
        - erosion
        - params.beta_j * j;

    let power = params.alpha_pl * l * kappa.love_power + params.alpha_pj * j - params.beta_p * p;

    let wisdom = params.alpha_wl * l * kappa.love_wisdom
        + params.alpha_wj * j
        + params.alpha_wp * p
        - params.beta_w * w;

    Forces {
        love,
        justice,
        power,
        wisdom,
    }
}

/// Outcome of a single integrator step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integration {
    pub state: StateVector,
    pub forces: Forces,
    /// Clipped accelerations actually applied.
    pub accelerations: [f64; 4],
}

impl Integration {
    /// Change applied to the state over the step.
    #[must_use]
    pub fn delta(&self, dt: f64) -> [f64; 4] {
        self.accelerations.map(|a| a * dt)
    }
}

/// Advance `state` by `dt`: `a = clamp(F / m, ±max_acceleration)`, `s' = s + a·dt`.
#[must_use]
pub fn integrate(
    state: &StateVector,
    params: &DynamicParameters,
    inertia: &Inertia,
    dt: f64,
    max_acceleration: f64,
) -> Integration {
    let forces = compute_forces(state, params);
    let masses = inertia.to_array();
    let raw = forces.to_array();
    let mut accelerations = [0.0; 4];
    for (slot, (force, mass)) in accelerations.iter_mut().zip(raw.iter().zip(masses)) {
        *slot = (force / mass).clamp(-max_acceleration, max_acceleration);
    }
    let current = state.to_array();
    let mut next = [0.0; 4];
    for (slot, (value, accel)) in next.iter_mut().zip(current.iter().zip(accelerations)) {
        *slot = value + accel * dt;
    }
    Integration {
        state: StateVector::from_array(next),
        forces,
        accelerations,
    }
}
