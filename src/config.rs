use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::semantic::{
    NegativeSimilarity, RiParams, DEFAULT_DELTA, DEFAULT_DIMENSION, DEFAULT_MODEL,
    DEFAULT_NONZEROS,
};

const CONFIG_FILE: &str = "config.yaml";

/// Default seed for context vector generation
const DEFAULT_SEED: u64 = 42;
/// Default number of search results
const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("config file is not valid utf8")]
    NotUtf8,

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Random-Indexing parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomIndexingConfig {
    /// Dimension of semantic vectors
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Nonzero positions per context vector (must be below `dimension`)
    #[serde(default = "default_nonzeros")]
    pub nonzeros: usize,

    /// Decay constant of the weighting function
    #[serde(default = "default_delta")]
    pub delta: f64,

    /// Seed for context vector generation; equal seeds replay identically
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// How anti-correlated notes are scored: "clamp" or "pass_through"
    #[serde(default)]
    pub negative_similarity: NegativeSimilarity,
}

impl Default for RandomIndexingConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            nonzeros: DEFAULT_NONZEROS,
            delta: DEFAULT_DELTA,
            seed: DEFAULT_SEED,
            negative_similarity: NegativeSimilarity::default(),
        }
    }
}

impl RandomIndexingConfig {
    pub fn params(&self) -> RiParams {
        RiParams {
            dimension: self.dimension,
            nonzeros: self.nonzeros,
            delta: self.delta,
        }
    }
}

/// Dense embedding settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseConfig {
    /// Without a dense model every search fails with "provider unavailable"
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Multilingual fastembed model (e.g. "multilingual-e5-small")
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for DenseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_nonzeros() -> usize {
    DEFAULT_NONZEROS
}

fn default_delta() -> f64 {
    DEFAULT_DELTA
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub random_indexing: RandomIndexingConfig,
    #[serde(default)]
    pub dense: DenseConfig,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            random_indexing: RandomIndexingConfig::default(),
            dense: DenseConfig::default(),
            default_top_k: DEFAULT_TOP_K,
            base_path: PathBuf::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.random_indexing
            .params()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("random_indexing: {e}")))?;

        if self.default_top_k == 0 {
            return Err(ConfigError::Invalid(
                "default_top_k must be greater than 0".to_string(),
            ));
        }

        if self.dense.enabled && self.dense.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "dense.model must be set when dense.enabled is true".to_string(),
            ));
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, creating it with defaults if missing.
    ///
    /// The file is re-saved when it lacks fields that have defaults.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let path = base_path.join(CONFIG_FILE);

        if !path.exists() {
            std::fs::create_dir_all(base_path)?;
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)?;
            log::info!("Created default config at {}", path.display());
        }

        let config_bytes = std::fs::read(&path)?;
        let config_str = String::from_utf8(config_bytes).map_err(|_| ConfigError::NotUtf8)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();
        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
