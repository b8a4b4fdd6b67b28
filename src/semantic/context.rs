//! Sparse random context signatures.
//!
//! Every ingested document gets one Context Index Vector: `k` distinct
//! positions in `[0, D)`, each carrying an independent +1/-1 sign. The
//! generator is injected so ingestion is reproducible under a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sign of a nonzero context position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn value(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

/// Sparse ±1 vector stored as `(position, sign)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextIndexVector {
    entries: Vec<(usize, Sign)>,
}

impl ContextIndexVector {
    pub fn new(entries: Vec<(usize, Sign)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, Sign)] {
        &self.entries
    }

    /// Number of nonzero positions.
    pub fn nonzeros(&self) -> usize {
        self.entries.len()
    }

    /// Add `weight * self` into `target` in place.
    pub fn accumulate_into(&self, target: &mut [f64], weight: f64) {
        for &(position, sign) in &self.entries {
            target[position] += sign.value() * weight;
        }
    }

    /// Expand into a dense vector of the given dimension.
    pub fn to_dense(&self, dimension: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dimension];
        self.accumulate_into(&mut dense, 1.0);
        dense
    }
}

/// Source of context signatures.
///
/// Implementations must return exactly `nonzeros` distinct positions below
/// `dimension`. Callers guarantee `1 <= nonzeros < dimension`.
pub trait IndexVectorSource: Send + Sync {
    fn draw(&mut self, dimension: usize, nonzeros: usize) -> ContextIndexVector;
}

/// Seedable pseudorandom source backed by `StdRng`.
pub struct SeededIndexVectors {
    rng: StdRng,
}

impl SeededIndexVectors {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl IndexVectorSource for SeededIndexVectors {
    fn draw(&mut self, dimension: usize, nonzeros: usize) -> ContextIndexVector {
        let positions = rand::seq::index::sample(&mut self.rng, dimension, nonzeros);

        let entries = positions
            .into_iter()
            .map(|position| {
                let sign = if self.rng.random_bool(0.5) {
                    Sign::Plus
                } else {
                    Sign::Minus
                };
                (position, sign)
            })
            .collect();

        ContextIndexVector::new(entries)
    }
}

/// Replays a fixed list of signatures in order, cycling when exhausted.
///
/// Makes overlap between documents exact in tests.
#[cfg(test)]
pub(crate) struct ScriptedIndexVectors {
    vectors: Vec<ContextIndexVector>,
    next: usize,
}

#[cfg(test)]
impl ScriptedIndexVectors {
    pub(crate) fn new(vectors: Vec<ContextIndexVector>) -> Self {
        Self { vectors, next: 0 }
    }
}

#[cfg(test)]
impl IndexVectorSource for ScriptedIndexVectors {
    fn draw(&mut self, _dimension: usize, _nonzeros: usize) -> ContextIndexVector {
        if self.vectors.is_empty() {
            return ContextIndexVector::new(Vec::new());
        }
        let vector = self.vectors[self.next % self.vectors.len()].clone();
        self.next += 1;
        vector
    }
}
