//! Deterministic utilities for reproducible sampling and training
//!
//! Provides a seeded 64-bit LCG, sampling without replacement, and the
//! tie-breaking key used when two split candidates have equal gain.

use std::num::Wrapping;

/// 64-bit Linear Congruential Generator (Knuth MMIX constants).
///
/// Output takes the high 32 bits of two consecutive states, since the low
/// bits of a power-of-two LCG have short periods.
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: Wrapping(seed),
        };
        // Decorrelate small neighbouring seeds.
        rng.step();
        rng
    }

    fn step(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0
    }

    pub fn next_u64(&mut self) -> u64 {
        let hi = self.step() >> 32;
        let lo = self.step() >> 32;
        (hi << 32) | lo
    }

    /// Uniform value in `[0, bound)`; 0 when `bound == 0`
    pub fn next_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        // Reject the tail that would bias the modulo.
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let x = self.next_u64();
            if x < zone {
                return x % bound;
            }
        }
    }

    /// `amount` distinct indices from `0..population`, in draw order.
    ///
    /// Partial Fisher-Yates; `amount` is capped at `population`.
    pub fn sample_indices(&mut self, population: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(population);
        let mut pool: Vec<usize> = (0..population).collect();
        for i in 0..amount {
            let j = i + self.next_below((population - i) as u64) as usize;
            pool.swap(i, j);
        }
        pool.truncate(amount);
        pool
    }
}

/// Deterministic tie-breaker for split selection
/// Orders candidates by (feature_idx, threshold bin, node_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub bin: usize,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, bin: usize, node_id: usize) -> Self {
        Self {
            feature_idx,
            bin,
            node_id,
        }
    }
}
