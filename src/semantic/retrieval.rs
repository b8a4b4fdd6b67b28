//! Hybrid retrieval over a growing note corpus.
//!
//! The `Retriever` owns one Random-Indexing engine per script and the
//! insertion-ordered list of ingested notes. Searching scores every note
//! with the fused dense + RI similarity and returns a stable top-K.
//!
//! Both engines and the corpus live behind a single `RwLock`, so an
//! ingestion is observed by searches either completely or not at all.

use std::sync::RwLock;

use serde::Serialize;

use crate::semantic::context::{ContextIndexVector, IndexVectorSource, SeededIndexVectors};
use crate::semantic::dense::{DenseError, DenseSimilarity};
use crate::semantic::ri::{RandomIndex, RiError, RiParams};
use crate::semantic::script::{split_languages, Script, SplitTokens};
use crate::semantic::similarity::{bilingual_similarity, fuse, NegativeSimilarity};

/// Errors returned by retrieval operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Dense similarity provider unavailable for note '{note_id}': {source}")]
    ProviderUnavailable {
        note_id: String,
        #[source]
        source: DenseError,
    },

    #[error("Indexing failed: {0}")]
    Index(#[from] RiError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub note_id: String,
    /// Fused score used for ranking
    pub score: f64,
    /// Dense-encoder similarity component
    pub dense: f64,
    /// Bilingual Random-Indexing similarity component
    pub ri: f64,
}

/// Draw a context vector for a non-empty token list.
fn draw_for(
    engine: &mut RandomIndex,
    tokens: &[String],
) -> Result<Option<ContextIndexVector>, RiError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    engine.draw_context().map(Some)
}

/// A note as seen by the retriever.
#[derive(Debug, Clone)]
struct IndexedNote {
    id: String,
    text: String,
    tokens: SplitTokens,
}

struct RetrieverState {
    latin: RandomIndex,
    native: RandomIndex,
    notes: Vec<IndexedNote>,
}

/// Bilingual Random-Indexing retriever.
pub struct Retriever {
    state: RwLock<RetrieverState>,
    policy: NegativeSimilarity,
}

impl Retriever {
    /// Create a retriever with explicit context-vector sources for each script.
    pub fn new(
        params: RiParams,
        policy: NegativeSimilarity,
        latin_source: Box<dyn IndexVectorSource>,
        native_source: Box<dyn IndexVectorSource>,
    ) -> Result<Self, RiError> {
        let latin = RandomIndex::new(params, latin_source)?;
        let native = RandomIndex::new(params, native_source)?;

        Ok(Self {
            state: RwLock::new(RetrieverState {
                latin,
                native,
                notes: Vec::new(),
            }),
            policy,
        })
    }

    /// Create a retriever whose engines draw from seeded generators.
    ///
    /// The native engine uses `seed + 1` so the two streams differ.
    pub fn seeded(
        params: RiParams,
        policy: NegativeSimilarity,
        seed: u64,
    ) -> Result<Self, RiError> {
        Self::new(
            params,
            policy,
            Box::new(SeededIndexVectors::new(seed)),
            Box::new(SeededIndexVectors::new(seed.wrapping_add(1))),
        )
    }

    /// Ingest a normalized note into both engines and make it searchable.
    ///
    /// Re-ingesting an existing id replaces its text in place; the
    /// accumulated vectors are append-only and keep the earlier evidence.
    pub fn ingest(&self, note_id: &str, text: &str) -> Result<(), SearchError> {
        let tokens = split_languages(text);

        let mut state = self
            .state
            .write()
            .map_err(|e| SearchError::Internal(format!("Lock poisoned: {}", e)))?;

        // draw both context vectors before touching either engine, so a
        // malformed draw leaves the corpus unchanged
        let latin_context = draw_for(&mut state.latin, tokens.tokens(Script::Latin))?;
        let native_context = draw_for(&mut state.native, tokens.tokens(Script::Native))?;

        if let Some(context) = &latin_context {
            state.latin.apply_context(tokens.tokens(Script::Latin), context);
        }
        if let Some(context) = &native_context {
            state.native.apply_context(tokens.tokens(Script::Native), context);
        }

        let note = IndexedNote {
            id: note_id.to_string(),
            text: text.to_string(),
            tokens,
        };

        match state.notes.iter_mut().find(|n| n.id == note_id) {
            Some(existing) => {
                log::debug!("re-ingested note '{}'", note_id);
                *existing = note;
            }
            None => state.notes.push(note),
        }

        Ok(())
    }

    /// Rank all notes against a normalized query.
    ///
    /// Ties keep insertion order. A failing dense provider aborts the search
    /// with `ProviderUnavailable`; it is never treated as a zero score.
    pub fn search(
        &self,
        query: &str,
        dense: &dyn DenseSimilarity,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_tokens = split_languages(query);

        let state = self
            .state
            .read()
            .map_err(|e| SearchError::Internal(format!("Lock poisoned: {}", e)))?;

        let mut hits = Vec::with_capacity(state.notes.len());
        for note in &state.notes {
            let dense_sim = dense.similarity(query, &note.id).map_err(|source| {
                SearchError::ProviderUnavailable {
                    note_id: note.id.clone(),
                    source,
                }
            })?;

            let ri_sim = bilingual_similarity(
                &query_tokens,
                &note.tokens,
                &state.latin,
                &state.native,
                self.policy,
            );

            hits.push(SearchHit {
                note_id: note.id.clone(),
                score: fuse(dense_sim, ri_sim),
                dense: dense_sim,
                ri: ri_sim,
            });
        }

        // sort_by is stable: equal scores keep insertion order
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        log::debug!(
            "search over {} notes returned {} hits",
            state.notes.len(),
            hits.len()
        );

        Ok(hits)
    }

    /// Number of ingested notes.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.notes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Note ids in insertion order.
    pub fn note_ids(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| s.notes.iter().map(|n| n.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Normalized text of an ingested note.
    pub fn note_text(&self, note_id: &str) -> Option<String> {
        self.state.read().ok().and_then(|s| {
            s.notes
                .iter()
                .find(|n| n.id == note_id)
                .map(|n| n.text.clone())
        })
    }

    /// Vocabulary sizes as (latin, native).
    pub fn vocabulary_sizes(&self) -> (usize, usize) {
        self.state
            .read()
            .map(|s| (s.latin.vocabulary_len(), s.native.vocabulary_len()))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::dense::UnavailableDense;
    use std::collections::HashMap;

    /// Dense provider returning fixed per-note scores.
    struct FixedDense(HashMap<String, f64>);

    impl FixedDense {
        fn uniform(value: f64, ids: &[&str]) -> Self {
            Self(ids.iter().map(|id| (id.to_string(), value)).collect())
        }
    }

    impl DenseSimilarity for FixedDense {
        fn similarity(&self, _query: &str, note_id: &str) -> Result<f64, DenseError> {
            self.0
                .get(note_id)
                .copied()
                .ok_or_else(|| DenseError::MissingEmbedding(note_id.to_string()))
        }
    }

    fn params() -> RiParams {
        RiParams {
            dimension: 300,
            nonzeros: 8,
            delta: 60.0,
        }
    }

    fn retriever() -> Retriever {
        Retriever::seeded(params(), NegativeSimilarity::Clamp, 42).unwrap()
    }

    #[test]
    fn test_invalid_params_fail_construction() {
        let bad = RiParams {
            dimension: 4,
            nonzeros: 4,
            delta: 60.0,
        };
        assert!(Retriever::seeded(bad, NegativeSimilarity::Clamp, 1).is_err());
    }

    #[test]
    fn test_ingest_updates_both_engines() {
        let retriever = retriever();
        retriever
            .ingest("n1", "Ravi doctor అవ్వాలని అనుకున్నాడు")
            .unwrap();

        assert_eq!(retriever.len(), 1);
        assert_eq!(retriever.vocabulary_sizes(), (2, 2));
    }

    #[test]
    fn test_unknown_query_scores_dense_only() {
        let retriever = retriever();
        retriever.ingest("n1", "ravi doctor").unwrap();

        let dense = FixedDense::uniform(0.6, &["n1"]);
        let hits = retriever.search("zzz qqq", &dense, 3).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ri, 0.0);
        assert_eq!(hits[0].score, fuse(0.6, 0.0));
    }

    #[test]
    fn test_top_k_larger_than_corpus() {
        let retriever = retriever();
        let ids = ["a", "b", "c", "d"];
        retriever.ingest("a", "ravi doctor hospital").unwrap();
        retriever.ingest("b", "arun engineer office").unwrap();
        retriever.ingest("c", "ravi arun friends").unwrap();
        retriever.ingest("d", "market vegetables").unwrap();

        let dense = FixedDense::uniform(0.2, &ids);
        let hits = retriever.search("ravi", &dense, 10).unwrap();

        assert_eq!(hits.len(), 4);
        let mut seen: Vec<&str> = hits.iter().map(|h| h.note_id.as_str()).collect();
        seen.sort();
        assert_eq!(seen, ids);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let retriever = retriever();
        for id in ["first", "second", "third"] {
            retriever.ingest(id, "").unwrap();
        }

        let dense = FixedDense::uniform(0.5, &["first", "second", "third"]);
        let hits = retriever.search("anything", &dense, 3).unwrap();

        let order: Vec<&str> = hits.iter().map(|h| h.note_id.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dense_score_drives_ranking() {
        let retriever = retriever();
        retriever.ingest("low", "one").unwrap();
        retriever.ingest("high", "two").unwrap();

        let dense = FixedDense(HashMap::from([
            ("low".to_string(), 0.1),
            ("high".to_string(), 0.9),
        ]));
        let hits = retriever.search("nothing known", &dense, 1).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, "high");
    }

    #[test]
    fn test_ri_signal_breaks_dense_tie() {
        let retriever = retriever();
        retriever.ingest("ravi", "ravi doctor hospital").unwrap();
        retriever.ingest("market", "market vegetables prices").unwrap();

        let dense = FixedDense::uniform(0.5, &["ravi", "market"]);
        let hits = retriever.search("doctor", &dense, 2).unwrap();

        // every word of a note shares its context vector, so the Latin
        // cosine is 1.0 and the absent native side halves it
        assert_eq!(hits[0].note_id, "ravi");
        assert!((hits[0].ri - 0.5).abs() < 1e-9);
        assert!(hits[1].ri < hits[0].ri);
    }

    #[test]
    fn test_provider_unavailable_propagates() {
        let retriever = retriever();
        retriever.ingest("n1", "ravi").unwrap();

        let result = retriever.search("ravi", &UnavailableDense::new("disabled"), 3);
        assert!(matches!(
            result,
            Err(SearchError::ProviderUnavailable { ref note_id, .. }) if note_id == "n1"
        ));
    }

    #[test]
    fn test_empty_corpus_needs_no_provider() {
        let retriever = retriever();
        let hits = retriever
            .search("ravi", &UnavailableDense::new("disabled"), 3)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_zero_top_k() {
        let retriever = retriever();
        retriever.ingest("n1", "ravi").unwrap();
        let dense = FixedDense::uniform(1.0, &["n1"]);
        assert!(retriever.search("ravi", &dense, 0).unwrap().is_empty());
    }

    #[test]
    fn test_reingest_replaces_text_in_place() {
        let retriever = retriever();
        retriever.ingest("a", "first version").unwrap();
        retriever.ingest("b", "other").unwrap();
        retriever.ingest("a", "second version").unwrap();

        assert_eq!(retriever.note_ids(), vec!["a", "b"]);
        assert_eq!(retriever.note_text("a").as_deref(), Some("second version"));
    }

    #[test]
    fn test_malformed_draw_leaves_corpus_unchanged() {
        use crate::semantic::context::{ContextIndexVector, ScriptedIndexVectors, Sign};

        let small = RiParams {
            dimension: 4,
            nonzeros: 2,
            delta: 60.0,
        };
        let good = ContextIndexVector::new(vec![(0, Sign::Plus), (1, Sign::Plus)]);
        let out_of_range = ContextIndexVector::new(vec![(0, Sign::Plus), (9, Sign::Plus)]);
        let retriever = Retriever::new(
            small,
            NegativeSimilarity::Clamp,
            Box::new(ScriptedIndexVectors::new(vec![good])),
            Box::new(ScriptedIndexVectors::new(vec![out_of_range])),
        )
        .unwrap();

        let result = retriever.ingest("n1", "ravi అన్నం");
        assert!(matches!(
            result,
            Err(SearchError::Index(RiError::InvalidContextVector(_)))
        ));
        assert!(retriever.is_empty());
        assert_eq!(retriever.vocabulary_sizes(), (0, 0));

        // a Latin-only note never draws from the native source
        retriever.ingest("n2", "ravi").unwrap();
        assert_eq!(retriever.note_ids(), vec!["n2"]);
    }
}
