//! Transition vectors and per-individual random streams
//!
//! Nothing in the engine touches a shared or platform RNG. Each individual
//! owns an `IndividualRng` seeded from its stored seed, so its path is
//! reproducible in isolation and independent of evaluation order.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::state::StateSpace;
use crate::error::{SimError, SimResult};

/// Allowed deviation of a transition vector's sum from 1
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Probability vector over the states of one layer, indexed by `S::index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionVector<S: StateSpace<N>, const N: usize> {
    probs: [f64; N],
    _layer: std::marker::PhantomData<S>,
}

impl<S: StateSpace<N>, const N: usize> TransitionVector<S, N> {
    /// Build from (state, probability) pairs; unlisted states get 0.
    ///
    /// Fails on a repeated state, a negative or non-finite entry, or a sum
    /// outside `1 ± SUM_TOLERANCE`. Vectors are never renormalized.
    pub fn from_entries(entries: &[(S, f64)]) -> SimResult<Self> {
        let mut probs = [0.0; N];
        let mut assigned = [false; N];
        for &(state, p) in entries {
            let idx = state.index();
            if assigned[idx] {
                return Err(malformed::<S, N>(&probs, format!("state {:?} listed twice", state)));
            }
            assigned[idx] = true;
            probs[idx] = p;
        }
        Self::from_array(probs)
    }

    /// Build from a raw array in `S::ALL` order
    pub fn from_array(probs: [f64; N]) -> SimResult<Self> {
        if let Some(p) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(malformed::<S, N>(&probs, format!("entry {} is negative or not finite", p)));
        }
        let total: f64 = probs.iter().sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(malformed::<S, N>(&probs, format!("entries sum to {}", total)));
        }
        Ok(Self {
            probs,
            _layer: std::marker::PhantomData,
        })
    }

    /// Stay in `state` with certainty
    pub fn certain(state: S) -> Self {
        let mut probs = [0.0; N];
        probs[state.index()] = 1.0;
        Self {
            probs,
            _layer: std::marker::PhantomData,
        }
    }

    pub fn prob(&self, state: S) -> f64 {
        self.probs[state.index()]
    }

    pub fn as_array(&self) -> [f64; N] {
        self.probs
    }

    /// Inverse-CDF categorical draw for a uniform `u` in [0, 1).
    ///
    /// Zero-probability states are never returned.
    pub fn sample(&self, u: f64) -> S {
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (idx, &p) in self.probs.iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            last_positive = idx;
            if u < cumulative {
                return S::ALL[idx];
            }
        }
        // u landed in the rounding gap below 1.0
        S::ALL[last_positive]
    }
}

fn malformed<S: StateSpace<N>, const N: usize>(probs: &[f64; N], reason: String) -> SimError {
    SimError::MalformedProbabilityVector {
        layer: S::LAYER,
        probs: probs.to_vec(),
        reason,
    }
}

/// Deterministic random stream owned by one individual
pub struct IndividualRng {
    inner: Pcg64Mcg,
    draws: u64,
}

impl IndividualRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw the next state from a transition vector
    pub fn draw<S: StateSpace<N>, const N: usize>(&mut self, vector: &TransitionVector<S, N>) -> S {
        let u = self.next_f64();
        vector.sample(u)
    }

    /// Number of uniforms consumed so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
