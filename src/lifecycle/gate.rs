//! Probability gate for the optional actions (issue creation, review).
//!
//! Each gated call site makes its own independent draw: sample `u` uniformly
//! from [0, 1) and fire iff `u < p / 100`.

use rand::Rng;

use crate::config::Probability;

/// A source of uniform samples in [0, 1).
pub trait Sampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// Samples from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn sample(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

#[cfg(test)]
pub(crate) use samplers::{ScriptedSampler, SeededSampler};


/// A Bernoulli trial with a fixed probability.
#[derive(Debug)]
pub struct ProbabilityGate<S = ThreadRngSampler> {
    probability: Probability,
    sampler: S,
}

impl<S: Sampler> ProbabilityGate<S> {
    pub fn with_sampler(probability: Probability, sampler: S) -> Self {
        ProbabilityGate {
            probability,
            sampler,
        }
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    /// Makes one independent draw.
    pub fn draw(&self) -> bool {
        self.sampler.sample() < self.probability.fraction()
    }
}
