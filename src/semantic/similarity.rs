//! Similarity scoring over Random-Indexing vectors and score fusion.
//!
//! - `language_similarity`: cosine between aggregated query and note vectors
//!   of a single script, 0.0 when either side has no known token
//! - `bilingual_similarity`: mean over the Latin and native engines
//! - `fuse`: equal-weight mean of dense and RI similarity

use serde::{Deserialize, Serialize};

use crate::semantic::ri::RandomIndex;
use crate::semantic::script::{Script, SplitTokens};

/// How negative cosine similarity (anti-correlated vectors) is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeSimilarity {
    /// Floor at 0.0, keeping every score in [0, 1]
    #[default]
    Clamp,
    /// Report the raw cosine, which may be below 0.0
    PassThrough,
}

impl NegativeSimilarity {
    fn apply(self, cosine: f64) -> f64 {
        match self {
            NegativeSimilarity::Clamp => cosine.max(0.0),
            NegativeSimilarity::PassThrough => cosine,
        }
    }
}

/// Cosine similarity, or `None` if either vector is all zeros.
///
/// Each vector is rescaled by its largest absolute component first: RI
/// weights can be tiny (e.g. `exp(-60)`) and their squares would underflow.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return None;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let x = x / scale_a;
        let y = y / scale_b;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    Some(cosine.clamp(-1.0, 1.0))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// Similarity of two token lists within one script's engine.
///
/// Returns exactly 0.0 when either side aggregates to the zero vector.
pub fn language_similarity<S: AsRef<str>>(
    query_tokens: &[S],
    doc_tokens: &[S],
    engine: &RandomIndex,
    policy: NegativeSimilarity,
) -> f64 {
    let query_vector = engine.vector_sum(query_tokens);
    let doc_vector = engine.vector_sum(doc_tokens);

    match cosine_similarity(&query_vector, &doc_vector) {
        Some(cosine) => policy.apply(cosine),
        None => 0.0,
    }
}

/// Mean of the Latin-script and native-script similarities.
///
/// Each script is scored only against its own engine.
pub fn bilingual_similarity(
    query: &SplitTokens,
    doc: &SplitTokens,
    latin: &RandomIndex,
    native: &RandomIndex,
    policy: NegativeSimilarity,
) -> f64 {
    let latin_sim = language_similarity(
        query.tokens(Script::Latin),
        doc.tokens(Script::Latin),
        latin,
        policy,
    );
    let native_sim = language_similarity(
        query.tokens(Script::Native),
        doc.tokens(Script::Native),
        native,
        policy,
    );

    (latin_sim + native_sim) / 2.0
}

/// Equal-weight fusion of dense-encoder and Random-Indexing similarity.
pub fn fuse(dense_similarity: f64, ri_similarity: f64) -> f64 {
    (dense_similarity + ri_similarity) / 2.0
}
