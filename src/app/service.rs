//! Note service: the surface the CLI talks to.
//!
//! Keeps the stored notes, the dense embedding cache and the in-memory
//! Random-Indexing state consistent:
//! - notes are always ingested in ascending id order, the same order a
//!   replay uses, so a restart reproduces the session's vectors
//! - adding a note whose id sorts last ingests it incrementally
//! - any other add, a replacement or a removal replays every stored note,
//!   since RI vectors cannot forget earlier evidence

use serde::Serialize;

use crate::{
    app::errors::ServiceError,
    config::Config,
    semantic::{
        CachedDenseSimilarity, DenseSimilarity, EmbeddingStore, Normalizer, Retriever,
        SearchHit, UnavailableDense,
    },
    storage::{validate_note_id, NoteStore},
};

/// Dense similarity with an optional on-disk cache.
pub struct DenseBackend {
    provider: CachedDenseSimilarity,
    store: Option<EmbeddingStore>,
    model_id: [u8; 32],
    dimensions: usize,
}

impl DenseBackend {
    pub fn new(
        provider: CachedDenseSimilarity,
        store: Option<EmbeddingStore>,
        model_id: [u8; 32],
        dimensions: usize,
    ) -> Self {
        Self {
            provider,
            store,
            model_id,
            dimensions,
        }
    }

    fn persist(&self) -> Result<(), ServiceError> {
        if let Some(store) = &self.store {
            store.save(&self.provider.snapshot(), &self.model_id, self.dimensions)?;
            log::debug!("Saved {} embeddings to {}", self.provider.len(), store.path().display());
        }
        Ok(())
    }
}

/// A search hit together with the note's normalized text.
#[derive(Debug, Clone, Serialize)]
pub struct NoteHit {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub text: String,
}

/// Outcome of replaying all stored notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Notes replayed into the Random-Indexing engines
    pub notes: usize,
    /// Notes whose dense embedding was (re)computed
    pub embedded: usize,
    /// Cached embeddings dropped because their note is gone
    pub pruned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub notes: usize,
    pub latin_vocabulary: usize,
    pub native_vocabulary: usize,
    pub dense_enabled: bool,
}

pub struct NoteService {
    config: Config,
    normalizer: Box<dyn Normalizer>,
    notes: Box<dyn NoteStore>,
    dense: Option<DenseBackend>,
    retriever: Retriever,
}

impl NoteService {
    /// Build the service and replay all stored notes.
    pub fn new(
        config: Config,
        normalizer: Box<dyn Normalizer>,
        notes: Box<dyn NoteStore>,
        dense: Option<DenseBackend>,
    ) -> Result<Self, ServiceError> {
        let retriever = Self::build_retriever(&config)?;

        let mut service = Self {
            config,
            normalizer,
            notes,
            dense,
            retriever,
        };
        service.rebuild()?;

        Ok(service)
    }

    fn build_retriever(config: &Config) -> Result<Retriever, ServiceError> {
        let ri = &config.random_indexing;
        Ok(Retriever::seeded(ri.params(), ri.negative_similarity, ri.seed)?)
    }

    pub fn is_dense_enabled(&self) -> bool {
        self.dense.is_some()
    }

    /// Store a note and make it searchable.
    ///
    /// The note is embedded before it is written, so a failing encoder leaves
    /// nothing behind. A note whose id sorts last is ingested incrementally;
    /// any other add replays the corpus so the in-memory state always equals
    /// a replay of the stored notes.
    pub fn add_note(&mut self, note_id: &str, raw_text: &str) -> Result<(), ServiceError> {
        validate_note_id(note_id)?;
        let text = self.normalizer.normalize(raw_text);

        if let Some(dense) = &self.dense {
            dense.provider.ensure_note(note_id, &text)?;
        }

        let stored = self.notes.list();
        let appends = stored.last().map_or(true, |last| last.as_str() < note_id);

        if let Err(e) = self.notes.write(note_id, raw_text) {
            if let Some(dense) = &self.dense {
                dense.provider.retain_notes(&stored);
            }
            return Err(e.into());
        }

        if let Some(dense) = &self.dense {
            dense.persist()?;
        }

        if !appends {
            log::info!("Note '{}' does not sort last, replaying all notes", note_id);
            self.rebuild()?;
            return Ok(());
        }

        if let Err(e) = self.retriever.ingest(note_id, &text) {
            log::warn!("Failed to index note '{}', removing it: {}", note_id, e);
            self.notes.delete(note_id)?;
            if let Some(dense) = &self.dense {
                dense.provider.retain_notes(&stored);
                dense.persist()?;
            }
            return Err(e.into());
        }

        log::info!("Added note '{}'", note_id);
        Ok(())
    }

    /// Delete a note and replay the remaining ones.
    pub fn remove_note(&mut self, note_id: &str) -> Result<(), ServiceError> {
        self.notes.delete(note_id)?;
        self.rebuild()?;
        log::info!("Removed note '{}'", note_id);
        Ok(())
    }

    /// Rebuild all in-memory state from the note store.
    ///
    /// Notes are replayed in ascending id order with the configured seed, so
    /// the same stored notes always produce the same vectors.
    pub fn rebuild(&mut self) -> Result<RebuildReport, ServiceError> {
        let retriever = Self::build_retriever(&self.config)?;
        let ids = self.notes.list();
        let mut report = RebuildReport {
            notes: ids.len(),
            ..Default::default()
        };

        for note_id in &ids {
            let text = self.normalizer.normalize(&self.notes.read(note_id)?);

            if let Some(dense) = &self.dense {
                if dense.provider.ensure_note(note_id, &text)? {
                    report.embedded += 1;
                }
            }
            retriever.ingest(note_id, &text)?;
        }

        if let Some(dense) = &self.dense {
            report.pruned = dense.provider.retain_notes(&ids);
            if report.embedded > 0 || report.pruned > 0 {
                dense.persist()?;
            }
        }

        self.retriever = retriever;
        log::info!(
            "Replayed {} notes ({} embedded, {} pruned)",
            report.notes,
            report.embedded,
            report.pruned
        );

        Ok(report)
    }

    /// Rank notes against a query.
    ///
    /// Fails with a provider-unavailable error when dense search is disabled
    /// and there is at least one note to score.
    pub fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<NoteHit>, ServiceError> {
        let query = self.normalizer.normalize(query);
        let top_k = top_k.unwrap_or(self.config.default_top_k);

        let unavailable = UnavailableDense::new("dense search is disabled in config");
        let provider: &dyn DenseSimilarity = match &self.dense {
            Some(dense) => &dense.provider,
            None => &unavailable,
        };

        let hits = self.retriever.search(&query, provider, top_k)?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let text = self.retriever.note_text(&hit.note_id).unwrap_or_default();
                NoteHit { hit, text }
            })
            .collect())
    }

    /// Note ids in ingestion order, which is ascending id order.
    pub fn note_ids(&self) -> Vec<String> {
        self.retriever.note_ids()
    }

    pub fn stats(&self) -> Stats {
        let (latin_vocabulary, native_vocabulary) = self.retriever.vocabulary_sizes();
        Stats {
            notes: self.retriever.len(),
            latin_vocabulary,
            native_vocabulary,
            dense_enabled: self.dense.is_some(),
        }
    }
}
