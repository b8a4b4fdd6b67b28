//! End-to-end checks of bilingual retrieval through the public API.
//!
//! The model-backed test downloads weights and is ignored by default.
//! Run with: cargo test -- --ignored

use crate::semantic::context::ScriptedIndexVectors;
use crate::semantic::{
    ContextIndexVector, DenseError, DenseSimilarity, EmbeddingModel, NegativeSimilarity,
    Retriever, RiParams, Sign, DEFAULT_MODEL,
};

/// Dense provider that scores every note the same.
struct FlatDense(f64);

impl DenseSimilarity for FlatDense {
    fn similarity(&self, _query: &str, _note_id: &str) -> Result<f64, DenseError> {
        Ok(self.0)
    }
}

fn params() -> RiParams {
    RiParams {
        dimension: 4,
        nonzeros: 2,
        delta: 60.0,
    }
}

fn plus(positions: &[usize]) -> ContextIndexVector {
    ContextIndexVector::new(positions.iter().map(|p| (*p, Sign::Plus)).collect())
}

fn scripted(latin: Vec<ContextIndexVector>, native: Vec<ContextIndexVector>) -> Retriever {
    Retriever::new(
        params(),
        NegativeSimilarity::Clamp,
        Box::new(ScriptedIndexVectors::new(latin)),
        Box::new(ScriptedIndexVectors::new(native)),
    )
    .unwrap()
}

#[test]
fn test_shared_context_ranks_above_unrelated() {
    // n1 and n2 overlap on one position, n3 is disjoint from both
    let retriever = scripted(
        vec![plus(&[0, 1]), plus(&[1, 2]), plus(&[2, 3])],
        Vec::new(),
    );
    retriever.ingest("n1", "cat milk").unwrap();
    retriever.ingest("n2", "fish milk").unwrap();
    retriever.ingest("n3", "car road").unwrap();

    let hits = retriever.search("cat", &FlatDense(0.0), 3).unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.note_id.as_str()).collect();

    assert_eq!(ids, vec!["n1", "n2", "n3"]);
    assert_eq!(hits[2].ri, 0.0);
}

#[test]
fn test_scripts_are_scored_independently() {
    let retriever = scripted(vec![plus(&[0, 1])], vec![plus(&[2, 3])]);
    retriever.ingest("n1", "ravi అన్నం").unwrap();

    // Latin query against a note with both scripts: native side contributes 0
    let hits = retriever.search("ravi", &FlatDense(0.0), 1).unwrap();
    assert!((hits[0].ri - 0.5).abs() < 1e-9);

    let hits = retriever.search("ravi అన్నం", &FlatDense(0.0), 1).unwrap();
    assert!((hits[0].ri - 1.0).abs() < 1e-9);
}

#[test]
fn test_fused_score_is_mean_of_signals() {
    let retriever = scripted(vec![plus(&[0, 1])], Vec::new());
    retriever.ingest("n1", "ravi").unwrap();

    let hits = retriever.search("ravi", &FlatDense(0.4), 1).unwrap();
    assert!((hits[0].dense - 0.4).abs() < 1e-12);
    assert!((hits[0].score - (0.4 + hits[0].ri) / 2.0).abs() < 1e-12);
}

#[test]
fn test_seeded_retrievers_agree() {
    let params = RiParams {
        dimension: 300,
        nonzeros: 8,
        delta: 60.0,
    };
    let a = Retriever::seeded(params, NegativeSimilarity::Clamp, 7).unwrap();
    let b = Retriever::seeded(params, NegativeSimilarity::Clamp, 7).unwrap();

    for retriever in [&a, &b] {
        retriever.ingest("n1", "ravi doctor అవ్వాలని").unwrap();
        retriever.ingest("n2", "doctor hospital ఆసుపత్రి").unwrap();
    }

    let dense = FlatDense(0.0);
    assert_eq!(
        a.search("doctor", &dense, 2).unwrap(),
        b.search("doctor", &dense, 2).unwrap()
    );
}

#[test]
#[ignore = "requires model download"]
fn test_model_scores_code_mixed_paraphrase() {
    let dir = tempfile::TempDir::new().unwrap();
    let model = EmbeddingModel::new(DEFAULT_MODEL, dir.path()).unwrap();

    let query = model.embed("doctor avvalani").unwrap();
    let close = model.embed("doctor అవ్వాలని").unwrap();
    let far = model.embed("rice market").unwrap();

    let cosine = |a: &[f32], b: &[f32]| -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    };

    assert_eq!(query.len(), model.dimensions());
    assert!(cosine(&query, &close) > cosine(&query, &far));
}
