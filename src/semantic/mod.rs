//! Bilingual semantic retrieval for code-mixed notes.
//!
//! Scores notes with two signals and averages them:
//! - a corpus-local Random-Indexing similarity, computed independently for
//!   Latin-script and native-script tokens
//! - a dense similarity from a multilingual embedding model
//!
//! # Architecture
//!
//! - `script`: splits text into Latin and native-script tokens
//! - `weighting`: accumulation weight for RI updates
//! - `context`: sparse random context vectors and their sources
//! - `ri`: per-script Random-Indexing engine
//! - `similarity`: cosine, bilingual mean and score fusion
//! - `retrieval`: ingestion and ranked search over the corpus
//! - `dense`: dense similarity providers
//! - `embeddings`: fastembed model wrapper
//! - `storage`: embeddings.bin cache of note embeddings
//! - `preprocess`: normalization and content hashing

pub mod context;
pub mod dense;
pub mod embeddings;
mod preprocess;
pub mod retrieval;
pub mod ri;
pub mod script;
pub mod similarity;
mod storage;
pub mod weighting;

pub use context::{ContextIndexVector, IndexVectorSource, SeededIndexVectors, Sign};
pub use dense::{CachedDenseSimilarity, DenseError, DenseSimilarity, Encoder, UnavailableDense};
pub use embeddings::{EmbeddingError, EmbeddingModel};
pub use preprocess::{content_hash, Normalizer, WhitespaceNormalizer};
pub use retrieval::{Retriever, SearchError, SearchHit};
pub use ri::{RandomIndex, RiError, RiParams, VocabEntry};
pub use script::{classify, split_languages, Script, SplitTokens};
pub use similarity::{bilingual_similarity, fuse, language_similarity, NegativeSimilarity};
pub use storage::{CachedEmbedding, EmbeddingMap, EmbeddingStore, EmbeddingStoreError};

/// Default dimension of semantic vectors
pub const DEFAULT_DIMENSION: usize = 300;

/// Default nonzero positions per context vector
pub const DEFAULT_NONZEROS: usize = 8;

/// Default decay constant of the weighting function
pub const DEFAULT_DELTA: f64 = 60.0;

/// Default dense embedding model
pub const DEFAULT_MODEL: &str = "multilingual-e5-small";
