//! Incremental Random-Indexing engine.
//!
//! Builds distributional word vectors without a co-occurrence matrix: each
//! document draws one sparse random context vector, and every word of the
//! document adds a weighted copy of it into its own semantic vector. Words
//! that keep appearing in the same documents end up with correlated vectors.
//!
//! One engine exists per script. Engines never share vocabulary or vectors.

use std::collections::{HashMap, HashSet};

use crate::semantic::context::{ContextIndexVector, IndexVectorSource};
use crate::semantic::weighting::weight;

/// Fixed engine parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiParams {
    /// Dimension D of every semantic vector
    pub dimension: usize,
    /// Nonzero positions k in each context vector
    pub nonzeros: usize,
    /// Decay constant for the weighting function
    pub delta: f64,
}

impl RiParams {
    pub fn validate(&self) -> Result<(), RiError> {
        if self.dimension == 0 {
            return Err(RiError::InvalidConfig(
                "dimension must be greater than 0".to_string(),
            ));
        }
        if self.nonzeros == 0 {
            return Err(RiError::InvalidConfig(
                "nonzeros must be greater than 0".to_string(),
            ));
        }
        if self.nonzeros >= self.dimension {
            return Err(RiError::InvalidConfig(format!(
                "nonzeros ({}) must be less than dimension ({})",
                self.nonzeros, self.dimension
            )));
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(RiError::InvalidConfig(format!(
                "delta must be a positive finite number, got {}",
                self.delta
            )));
        }
        Ok(())
    }
}

/// Errors raised by the Random-Indexing engine.
#[derive(Debug, thiserror::Error)]
pub enum RiError {
    #[error("Invalid random indexing configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid context vector: {0}")]
    InvalidContextVector(String),
}

/// Vocabulary entry: stable index and occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabEntry {
    pub index: usize,
    pub count: u64,
}

/// Random-Indexing engine for a single script.
pub struct RandomIndex {
    params: RiParams,
    vocabulary: HashMap<String, VocabEntry>,
    /// Index-aligned with `vocabulary` entries
    vectors: Vec<Vec<f64>>,
    source: Box<dyn IndexVectorSource>,
}

impl RandomIndex {
    /// Create an empty engine. Fails if the parameters are invalid.
    pub fn new(params: RiParams, source: Box<dyn IndexVectorSource>) -> Result<Self, RiError> {
        params.validate()?;

        Ok(Self {
            params,
            vocabulary: HashMap::new(),
            vectors: Vec::new(),
            source,
        })
    }

    pub fn params(&self) -> RiParams {
        self.params
    }

    /// Number of distinct words seen.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn entry(&self, word: &str) -> Option<VocabEntry> {
        self.vocabulary.get(word).copied()
    }

    /// Semantic vector of a known word.
    pub fn vector(&self, word: &str) -> Option<&[f64]> {
        self.vocabulary
            .get(word)
            .map(|entry| self.vectors[entry.index].as_slice())
    }

    /// Ingest one document.
    ///
    /// Draws a single context vector and accumulates it, weighted, into the
    /// semantic vector of every token. Duplicate tokens are accumulated once
    /// per occurrence. An empty document is a no-op and consumes no draw.
    ///
    /// Fails without touching the vocabulary if the source returns a
    /// malformed context vector.
    pub fn index_document<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), RiError> {
        if tokens.is_empty() {
            return Ok(());
        }

        let context = self.draw_context()?;
        self.apply_context(tokens, &context);
        Ok(())
    }

    /// Draw the next context vector and check it against the parameters:
    /// exactly `nonzeros` distinct positions, all below `dimension`.
    pub(crate) fn draw_context(&mut self) -> Result<ContextIndexVector, RiError> {
        let context = self
            .source
            .draw(self.params.dimension, self.params.nonzeros);

        if context.nonzeros() != self.params.nonzeros {
            return Err(RiError::InvalidContextVector(format!(
                "expected {} nonzero positions, got {}",
                self.params.nonzeros,
                context.nonzeros()
            )));
        }

        let mut seen = HashSet::with_capacity(context.nonzeros());
        for &(position, _) in context.entries() {
            if position >= self.params.dimension {
                return Err(RiError::InvalidContextVector(format!(
                    "position {} out of range for dimension {}",
                    position, self.params.dimension
                )));
            }
            if !seen.insert(position) {
                return Err(RiError::InvalidContextVector(format!(
                    "duplicate position {}",
                    position
                )));
            }
        }

        Ok(context)
    }

    /// Accumulate a checked context vector into every token's semantic vector.
    pub(crate) fn apply_context<S: AsRef<str>>(&mut self, tokens: &[S], context: &ContextIndexVector) {
        for token in tokens {
            let token = token.as_ref();

            let entry = match self.vocabulary.get_mut(token) {
                Some(entry) => {
                    entry.count += 1;
                    *entry
                }
                None => {
                    let entry = VocabEntry {
                        index: self.vectors.len(),
                        count: 1,
                    };
                    self.vocabulary.insert(token.to_string(), entry);
                    self.vectors.push(vec![0.0; self.params.dimension]);
                    entry
                }
            };

            let w = weight(entry.count, self.vocabulary.len(), self.params.delta);
            context.accumulate_into(&mut self.vectors[entry.index], w);
        }

        log::trace!(
            "indexed {} tokens, vocabulary size {}",
            tokens.len(),
            self.vocabulary.len()
        );
    }

    /// Elementwise sum of the semantic vectors of all known tokens.
    ///
    /// Unknown tokens are skipped. Returns the zero vector when no token is known.
    pub fn vector_sum<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f64> {
        let mut sum = vec![0.0; self.params.dimension];

        for token in tokens {
            if let Some(entry) = self.vocabulary.get(token.as_ref()) {
                for (acc, value) in sum.iter_mut().zip(&self.vectors[entry.index]) {
                    *acc += value;
                }
            }
        }

        sum
    }
}

impl std::fmt::Debug for RandomIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomIndex")
            .field("params", &self.params)
            .field("vocabulary_len", &self.vocabulary.len())
            .finish()
    }
}
