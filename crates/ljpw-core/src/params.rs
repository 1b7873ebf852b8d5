//! Parameter records governing the force model and integrator.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lower bound applied to every parameter after mutation.
pub const DEFAULT_MUTATION_FLOOR: f64 = 0.01;

/// Growth, decay and coupling rates consumed by the force model.
///
/// Owned by one engine. The optimizer mutates clones and swaps whole records in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DynamicParameters {
    pub alpha_lj: f64,
    pub alpha_lw: f64,
    pub alpha_jl: f64,
    pub alpha_jw: f64,
    pub alpha_pl: f64,
    pub alpha_pj: f64,
    pub alpha_wl: f64,
    pub alpha_wj: f64,
    pub alpha_wp: f64,
    pub beta_l: f64,
    pub beta_j: f64,
    pub beta_p: f64,
    pub beta_w: f64,
    /// Power erosion of Justice.
    pub gamma: f64,
    /// Justice-Love saturation constant.
    pub k_jl: f64,
}

impl Default for DynamicParameters {
    fn default() -> Self {
        Self {
            alpha_lj: 0.12,
            alpha_lw: 0.12,
            alpha_jl: 0.14,
            alpha_jw: 0.14,
            alpha_pl: 0.12,
            alpha_pj: 0.12,
            alpha_wl: 0.10,
            alpha_wj: 0.10,
            alpha_wp: 0.10,
            beta_l: 0.20,
            beta_j: 0.20,
            beta_p: 0.20,
            beta_w: 0.24,
            gamma: 0.08,
            k_jl: 0.59,
        }
    }
}

impl DynamicParameters {
    /// Number of named parameters.
    pub const LEN: usize = 15;

    /// Parameter names in declaration order, aligned with [`Self::values`].
    pub const NAMES: [&'static str; Self::LEN] = [
        "alpha_lj", "alpha_lw", "alpha_jl", "alpha_jw", "alpha_pl", "alpha_pj", "alpha_wl",
        "alpha_wj", "alpha_wp", "beta_l", "beta_j", "beta_p", "beta_w", "gamma", "k_jl",
    ];

    /// Snapshot of every value in declaration order.
    #[must_use]
    pub fn values(&self) -> [f64; Self::LEN] {
        [
            self.alpha_lj,
            self.alpha_lw,
            self.alpha_jl,
            self.alpha_jw,
            self.alpha_pl,
            self.alpha_pj,
            self.alpha_wl,
            self.alpha_wj,
            self.alpha_wp,
            self.beta_l,
            self.beta_j,
            self.beta_p,
            self.beta_w,
            self.gamma,
            self.k_jl,
        ]
    }

    fn values_mut(&mut self) -> [&mut f64; Self::LEN] {
        [
            &mut self.alpha_lj,
            &mut self.alpha_lw,
            &mut self.alpha_jl,
            &mut self.alpha_jw,
            &mut self.alpha_pl,
            &mut self.alpha_pj,
            &mut self.alpha_wl,
            &mut self.alpha_wj,
            &mut self.alpha_wp,
            &mut self.beta_l,
            &mut self.beta_j,
            &mut self.beta_p,
            &mut self.beta_w,
            &mut self.gamma,
            &mut self.k_jl,
        ]
    }

    /// Name/value pairs, mainly for reports.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        Self::NAMES.into_iter().zip(self.values())
    }

    /// Whether every parameter is finite and strictly positive.
    #[must_use]
    pub fn all_positive(&self) -> bool {
        self.values().iter().all(|v| v.is_finite() && *v > 0.0)
    }

    /// Nudge every value by up to `±rate · value`, flooring at `floor`.
    ///
    /// A non-positive or non-finite `rate` leaves the values untouched apart from the floor.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: f64, floor: f64) {
        let spread = rate.is_finite() && rate > 0.0;
        for value in self.values_mut() {
            let noise = if spread {
                rng.random_range(-rate..rate) * *value
            } else {
                0.0
            };
            *value = (*value + noise).max(floor);
        }
    }

    /// Convenience wrapper using [`DEFAULT_MUTATION_FLOOR`].
    pub fn random_mutation<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: f64) {
        self.mutate(rng, rate, DEFAULT_MUTATION_FLOOR);
    }
}

/// Characteristic response times per axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeConstants {
    pub tau_l: f64,
    pub tau_j: f64,
    pub tau_p: f64,
    pub tau_w: f64,
}

impl Default for TimeConstants {
    fn default() -> Self {
        Self {
            tau_l: 1.0,
            tau_j: 2.0,
            tau_p: 5.0,
            tau_w: 0.5,
        }
    }
}

impl TimeConstants {
    #[must_use]
    pub const fn taus(&self) -> [f64; 4] {
        [self.tau_l, self.tau_j, self.tau_p, self.tau_w]
    }

    /// Angular frequency `ω = 1/τ` per axis.
    #[must_use]
    pub fn angular_frequencies(&self) -> [f64; 4] {
        self.taus().map(|tau| 1.0 / tau)
    }
}

/// Per-axis divisor converting force into acceleration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Inertia {
    pub love: f64,
    pub justice: f64,
    pub power: f64,
    pub wisdom: f64,
}

impl Default for Inertia {
    fn default() -> Self {
        // Love is light, Power is heavy, Justice fixed, Wisdom baseline.
        Self {
            love: 0.236,
            justice: 0.414,
            power: 2.618,
            wisdom: 1.0,
        }
    }
}

impl Inertia {
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.love, self.justice, self.power, self.wisdom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn defaults_are_positive() {
        assert!(DynamicParameters::default().all_positive());
        assert_eq!(DynamicParameters::default().iter().count(), DynamicParameters::LEN);
    }

    #[test]
    fn mutation_stays_within_proportional_band() {
        let mut rng = SmallRng::seed_from_u64(0xDEADBEEF);
        let base = DynamicParameters::default();
        let mut mutated = base;
        mutated.random_mutation(&mut rng, 0.05);
        for (before, after) in base.values().iter().zip(mutated.values()) {
            assert!((after - before).abs() <= 0.05 * before + 1e-12);
        }
        assert_ne!(base, mutated);
    }

    #[test]
    fn repeated_mutation_never_goes_non_positive() {
        let mut rng = SmallRng::seed_from_u64(42);
        for rate in [0.01, 0.3, 0.75, 0.99] {
            let mut params = DynamicParameters::default();
            for _ in 0..2_000 {
                params.random_mutation(&mut rng, rate);
                assert!(params.all_positive(), "rate {rate} produced {params:?}");
                assert!(params.values().iter().all(|v| *v >= DEFAULT_MUTATION_FLOOR));
            }
        }
    }

    #[test]
    fn zero_rate_leaves_values_alone() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut params = DynamicParameters::default();
        params.random_mutation(&mut rng, 0.0);
        assert_eq!(params, DynamicParameters::default());
    }

    #[test]
    fn angular_frequency_inverts_tau() {
        let omega = TimeConstants::default().angular_frequencies();
        assert_eq!(omega, [1.0, 0.5, 0.2, 2.0]);
    }
}
