use crate::{
    config::ConfigError,
    semantic::{DenseError, EmbeddingError, EmbeddingStoreError, RiError, SearchError},
    storage::NoteStoreError,
};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("note storage error: {0}")]
    Notes(#[from] NoteStoreError),

    #[error("random indexing error: {0}")]
    RandomIndex(#[from] RiError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("dense similarity error: {0}")]
    Dense(#[from] DenseError),

    #[error("embedding model error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding cache error: {0}")]
    EmbeddingStore(#[from] EmbeddingStoreError),
}

impl ServiceError {
    /// True when the search failed because dense similarity could not be computed.
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(
            self,
            ServiceError::Search(SearchError::ProviderUnavailable { .. })
        )
    }
}
