//! Rolling-window variance test over recorded efficiency.

use std::collections::VecDeque;

/// Default number of trailing samples inspected.
pub const DEFAULT_WINDOW: usize = 10;
/// Default variance below which the series counts as converged.
pub const DEFAULT_THRESHOLD: f64 = 1e-4;

/// Tracks the trailing efficiency samples and reports convergence.
///
/// The flag is recomputed on every observation and can drop back to `false`.
#[derive(Debug, Clone)]
pub struct ConvergenceDetector {
    window: usize,
    threshold: f64,
    samples_seen: usize,
    recent: VecDeque<f64>,
    converged: bool,
}

impl Default for ConvergenceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_THRESHOLD)
    }
}

impl ConvergenceDetector {
    #[must_use]
    pub fn new(window: usize, threshold: f64) -> Self {
        Self {
            window,
            threshold,
            samples_seen: 0,
            recent: VecDeque::with_capacity(window),
            converged: false,
        }
    }

    /// Record one sample and return the updated flag.
    ///
    /// The test only runs once strictly more than `window` samples have been seen.
    pub fn observe(&mut self, efficiency: f64) -> bool {
        self.samples_seen += 1;
        if self.recent.len() >= self.window {
            self.recent.pop_front();
        }
        if self.window > 0 {
            self.recent.push_back(efficiency);
        }
        self.converged = match self.variance() {
            Some(variance) if self.samples_seen > self.window => variance < self.threshold,
            _ => false,
        };
        self.converged
    }

    /// Population variance of the trailing window, if it is full.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        if self.window == 0 || self.recent.len() < self.window {
            return None;
        }
        let n = self.recent.len() as f64;
        let mean = self.recent.iter().sum::<f64>() / n;
        Some(self.recent.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n)
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    #[must_use]
    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn reset(&mut self) {
        self.samples_seen = 0;
        self.recent.clear();
        self.converged = false;
    }
}
