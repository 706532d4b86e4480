//! Server configuration, read from `CINEMATCH_*` environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.

use std::path::PathBuf;

use pipeline::{EncoderConfig, DEFAULT_MAX_TFIDF_FEATURES, DEFAULT_MAX_WORDS, SEQUENCE_LENGTH};
use serde::Deserialize;

use crate::recommender::{RecommenderSettings, ScorerKind, DEFAULT_TOP_K};

const ENV_PREFIX: &str = "CINEMATCH_";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// IMDB Top-1000 style CSV file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Recommendations returned per title
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Seed for the ranking model when no weights file is used
    #[serde(default = "default_model_seed")]
    pub model_seed: u64,

    /// JSON weights written by `cinematch export-weights` or an offline trainer
    #[serde(default)]
    pub weights_path: Option<PathBuf>,

    /// Skip the ranking model and rank by content similarity only
    #[serde(default)]
    pub similarity_only: bool,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    #[serde(default = "default_max_tfidf_features")]
    pub max_tfidf_features: usize,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/imdb_top_1000.csv")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_model_seed() -> u64 {
    42
}

fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

fn default_max_tfidf_features() -> usize {
    DEFAULT_MAX_TFIDF_FEATURES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            host: default_host(),
            port: default_port(),
            top_k: default_top_k(),
            model_seed: default_model_seed(),
            weights_path: None,
            similarity_only: false,
            max_words: default_max_words(),
            max_tfidf_features: default_max_tfidf_features(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.top_k == 0 {
            anyhow::bail!("{}TOP_K must be at least 1", ENV_PREFIX);
        }
        Ok(config)
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for building the recommender
    pub fn recommender_settings(&self) -> RecommenderSettings {
        let scorer = if self.similarity_only {
            ScorerKind::Uniform
        } else {
            ScorerKind::Model {
                seed: self.model_seed,
                weights_path: self.weights_path.clone(),
            }
        };

        RecommenderSettings {
            encoder: EncoderConfig {
                max_words: self.max_words,
                max_tfidf_features: self.max_tfidf_features,
                sequence_length: SEQUENCE_LENGTH,
            },
            scorer,
            ..RecommenderSettings::default()
        }
    }
}
