//! Dense-embedding similarity providers.
//!
//! The retriever asks a `DenseSimilarity` for one score per (query, note).
//! `CachedDenseSimilarity` answers from cached note embeddings and embeds
//! the query at most once per distinct query text.

use std::sync::{Mutex, RwLock};

use crate::semantic::embeddings::{EmbeddingError, EmbeddingModel};
use crate::semantic::preprocess::content_hash;
use crate::semantic::storage::{CachedEmbedding, EmbeddingMap};

/// Errors reported by a dense similarity provider.
#[derive(Debug, thiserror::Error)]
pub enum DenseError {
    #[error("Dense similarity is unavailable: {0}")]
    Unavailable(String),

    #[error("No cached embedding for note '{0}'")]
    MissingEmbedding(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Similarity between a query and a stored note from a contextual encoder.
pub trait DenseSimilarity: Send + Sync {
    fn similarity(&self, query: &str, note_id: &str) -> Result<f64, DenseError>;
}

/// Provider used when dense search is disabled. Every call fails.
pub struct UnavailableDense {
    reason: String,
}

impl UnavailableDense {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl DenseSimilarity for UnavailableDense {
    fn similarity(&self, _query: &str, _note_id: &str) -> Result<f64, DenseError> {
        Err(DenseError::Unavailable(self.reason.clone()))
    }
}

/// Encodes text into a dense vector.
pub trait Encoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl Encoder for EmbeddingModel {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(text)
    }
}

/// Dense similarity over cached per-note embeddings.
pub struct CachedDenseSimilarity {
    encoder: Box<dyn Encoder>,
    embeddings: RwLock<EmbeddingMap>,
    /// Last query text and its embedding
    last_query: Mutex<Option<(String, Vec<f32>)>>,
}

impl CachedDenseSimilarity {
    pub fn new(encoder: Box<dyn Encoder>) -> Self {
        Self::with_entries(encoder, EmbeddingMap::new())
    }

    /// Start from embeddings loaded from the cache file.
    pub fn with_entries(encoder: Box<dyn Encoder>, entries: EmbeddingMap) -> Self {
        Self {
            encoder,
            embeddings: RwLock::new(entries),
            last_query: Mutex::new(None),
        }
    }

    /// Make sure the cached embedding of a note matches its current text.
    ///
    /// Returns `true` if the note had to be (re-)embedded.
    pub fn ensure_note(&self, note_id: &str, text: &str) -> Result<bool, DenseError> {
        let hash = content_hash(text);

        let fresh = self
            .embeddings
            .read()
            .map_err(|e| DenseError::Unavailable(format!("Lock poisoned: {}", e)))?
            .get(note_id)
            .is_some_and(|cached| cached.content_hash == hash);
        if fresh {
            return Ok(false);
        }

        let embedding = self.encoder.encode(text)?;
        self.embeddings
            .write()
            .map_err(|e| DenseError::Unavailable(format!("Lock poisoned: {}", e)))?
            .insert(
                note_id.to_string(),
                CachedEmbedding {
                    content_hash: hash,
                    embedding,
                },
            );

        Ok(true)
    }

    /// Drop embeddings of notes that no longer exist. Returns how many were removed.
    pub fn retain_notes(&self, note_ids: &[String]) -> usize {
        match self.embeddings.write() {
            Ok(mut embeddings) => {
                let before = embeddings.len();
                embeddings.retain(|id, _| note_ids.contains(id));
                before - embeddings.len()
            }
            Err(_) => 0,
        }
    }

    /// Copy of all cached embeddings, for persisting.
    pub fn snapshot(&self) -> EmbeddingMap {
        self.embeddings
            .read()
            .map(|embeddings| embeddings.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, note_id: &str) -> bool {
        self.embeddings
            .read()
            .map(|embeddings| embeddings.contains_key(note_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.embeddings.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn query_embedding(&self, query: &str) -> Result<Vec<f32>, DenseError> {
        let mut last = self
            .last_query
            .lock()
            .map_err(|e| DenseError::Unavailable(format!("Lock poisoned: {}", e)))?;

        if let Some((text, embedding)) = last.as_ref() {
            if text == query {
                return Ok(embedding.clone());
            }
        }

        let embedding = self.encoder.encode(query)?;
        *last = Some((query.to_string(), embedding.clone()));
        Ok(embedding)
    }
}

impl DenseSimilarity for CachedDenseSimilarity {
    fn similarity(&self, query: &str, note_id: &str) -> Result<f64, DenseError> {
        let query_embedding = self.query_embedding(query)?;

        let embeddings = self
            .embeddings
            .read()
            .map_err(|e| DenseError::Unavailable(format!("Lock poisoned: {}", e)))?;
        let cached = embeddings
            .get(note_id)
            .ok_or_else(|| DenseError::MissingEmbedding(note_id.to_string()))?;

        Ok(cosine_f32(&query_embedding, &cached.embedding))
    }
}

/// Cosine similarity of two embeddings; 0.0 if either has zero norm.
fn cosine_f32(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a < f64::EPSILON || norm_b < f64::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
