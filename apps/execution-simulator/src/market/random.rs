//! Injectable randomness for the simulator and the fill model.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Source of random draws.
///
/// Every stochastic decision (seed prices, price walk, latency, rejects,
/// slippage) goes through this trait so tests can pin the sequence.
pub trait RandomSource: Send {
    /// Uniform draw from `[low, high]`. Returns `low` when the range is empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Draw from `N(0, std_dev)`. Returns 0 for a non-positive deviation.
    fn gaussian(&mut self, std_dev: f64) -> f64;

    /// Uniform integer from `[low, high]`. Returns `low` when the range is empty.
    fn integer(&mut self, low: u64, high: u64) -> u64;

    /// Returns true with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        probability >= 1.0 || (probability > 0.0 && self.uniform(0.0, 1.0) < probability)
    }
}

/// `StdRng`-backed source, reproducible when seeded.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded source when `seed` is set, OS-seeded otherwise.
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::new)
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return 0.0;
        }
        Normal::new(0.0, std_dev).map_or(0.0, |normal| normal.sample(&mut self.rng))
    }

    fn integer(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}
