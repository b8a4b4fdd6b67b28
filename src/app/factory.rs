use crate::{
    app::service::{DenseBackend, NoteService},
    config::Config,
    semantic::{
        CachedDenseSimilarity, EmbeddingMap, EmbeddingModel, EmbeddingStore, EmbeddingStoreError,
        WhitespaceNormalizer,
    },
    storage::LocalNoteStore,
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::{Path, PathBuf};

const EMBEDDINGS_FILE: &str = "embeddings.bin";
const NOTES_DIR: &str = "notes";

/// Application factory wiring config, storage and models into a `NoteService`
pub struct AppFactory;

impl AppFactory {
    /// Open the service rooted at `base_path`
    pub fn create_service(base_path: &Path) -> Result<NoteService> {
        std::fs::create_dir_all(base_path)
            .context("Failed to create application base directory")?;

        let config = Config::load_with(base_path).context("Failed to load config")?;

        let notes = LocalNoteStore::new(&base_path.join(NOTES_DIR))
            .context("Failed to open notes directory")?;

        let dense = if config.dense.enabled {
            Some(Self::create_dense_backend(&config.dense.model, base_path)?)
        } else {
            log::warn!("Dense search is disabled; searches will report the provider as unavailable");
            None
        };

        let service = NoteService::new(
            config,
            Box::new(WhitespaceNormalizer),
            Box::new(notes),
            dense,
        )
        .context("Failed to build note index")?;

        Ok(service)
    }

    /// Load the embedding model and its on-disk cache
    fn create_dense_backend(model_name: &str, base_path: &Path) -> Result<DenseBackend> {
        let model = EmbeddingModel::new(model_name, base_path)
            .with_context(|| format!("Failed to load embedding model '{model_name}'"))?;

        log::info!("Dense search using '{}'", model.name());
        let model_id = model.model_id_hash();
        let dimensions = model.dimensions();

        let store = EmbeddingStore::new(base_path.join(EMBEDDINGS_FILE));
        let entries = Self::load_embeddings(&store, &model_id, dimensions)?;

        let provider = CachedDenseSimilarity::with_entries(Box::new(model), entries);
        Ok(DenseBackend::new(provider, Some(store), model_id, dimensions))
    }

    /// Load cached embeddings, starting fresh when they belong to another model
    fn load_embeddings(
        store: &EmbeddingStore,
        model_id: &[u8; 32],
        dimensions: usize,
    ) -> Result<EmbeddingMap> {
        if !store.exists() {
            log::info!("No embedding cache, starting fresh");
            return Ok(EmbeddingMap::new());
        }

        match store.load(model_id, dimensions) {
            Ok(entries) => {
                log::info!("Loaded {} embeddings from cache", entries.len());
                Ok(entries)
            }
            Err(EmbeddingStoreError::ModelMismatch)
            | Err(EmbeddingStoreError::DimensionMismatch { .. }) => {
                log::warn!("Model changed, recomputing embeddings");
                Ok(EmbeddingMap::new())
            }
            Err(EmbeddingStoreError::VersionMismatch(file_ver, _)) => {
                log::warn!("Embedding cache version {} unsupported, recomputing", file_ver);
                Ok(EmbeddingMap::new())
            }
            Err(EmbeddingStoreError::ChecksumMismatch) => {
                log::warn!("Embedding cache is corrupted, recomputing");
                Ok(EmbeddingMap::new())
            }
            Err(e) => Err(e).context("Failed to load embedding cache"),
        }
    }

    /// Base directory: `MIXNOTE_BASE_PATH` or `~/.local/share/mixnote`
    pub fn get_base_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("MIXNOTE_BASE_PATH") {
            return Ok(PathBuf::from(path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(home.join(".local/share/mixnote"))
    }
}
