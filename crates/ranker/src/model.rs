//! The neural ranking model: query movie features in, a probability per
//! catalog movie out.
//!
//! ## Architecture
//! ```text
//! genre (n_genres)  -> Dense(64, relu)                          -> 64 ┐
//! overview ids (L)  -> Embedding(vocab, 100) -> LSTM(128, seq)
//!                                            -> LSTM(64, last)  -> 64 ├ concat 160
//! director (n_dirs) -> Dense(32, relu)                          -> 32 ┘
//!   -> Dense(256, relu) -> Dense(128, relu) -> Dense(n_items, softmax)
//! ```
//! Dropout layers of the training graph are identity at inference and are not
//! represented.
//!
//! ## Weights
//! Weights are never learned here. They are either initialised from a seed
//! (Keras default initialisers) or loaded from a JSON file written by
//! `RankingModel::save`, which an offline trainer can overwrite.

use crate::error::{RankerError, Result};
use crate::layers::{softmax, Dense, Embedding, Lstm};
use ndarray::{concatenate, Array1, Axis};
use pipeline::{EncodingTables, QueryFeatures};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const GENRE_UNITS: usize = 64;
pub const EMBEDDING_DIM: usize = 100;
pub const TEXT_LSTM_UNITS: usize = 128;
pub const TEXT_UNITS: usize = 64;
pub const DIRECTOR_UNITS: usize = 32;
pub const FUSION_UNITS: [usize; 2] = [256, 128];

/// Input and output widths; everything else is fixed by the architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelShape {
    pub n_genres: usize,
    pub vocab_size: usize,
    pub n_directors: usize,
    pub n_items: usize,
}

impl ModelShape {
    /// Shape matching a fitted catalog encoding
    pub fn from_tables(tables: &EncodingTables, n_items: usize) -> Self {
        Self {
            n_genres: tables.genres.len(),
            vocab_size: tables.tokenizer.vocab_size(),
            n_directors: tables.directors.len(),
            n_items,
        }
    }
}

/// Where a model's weights came from
#[derive(Debug, Clone, PartialEq)]
pub enum WeightsOrigin {
    Seeded(u64),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingModel {
    shape: ModelShape,
    genre_dense: Dense,
    embedding: Embedding,
    text_lstm: Lstm,
    text_lstm_last: Lstm,
    director_dense: Dense,
    fusion_hidden: Dense,
    fusion_narrow: Dense,
    output: Dense,
    #[serde(skip, default = "unknown_origin")]
    origin: WeightsOrigin,
}

fn unknown_origin() -> WeightsOrigin {
    WeightsOrigin::File(String::new())
}

impl RankingModel {
    /// Fresh, untrained model with deterministic weights.
    ///
    /// The same shape and seed always produce identical parameters.
    pub fn initialize(shape: ModelShape, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let concat_dim = GENRE_UNITS + TEXT_UNITS + DIRECTOR_UNITS;

        Self {
            shape,
            genre_dense: Dense::glorot(shape.n_genres, GENRE_UNITS, &mut rng),
            embedding: Embedding::uniform(shape.vocab_size, EMBEDDING_DIM, &mut rng),
            text_lstm: Lstm::random(EMBEDDING_DIM, TEXT_LSTM_UNITS, &mut rng),
            text_lstm_last: Lstm::random(TEXT_LSTM_UNITS, TEXT_UNITS, &mut rng),
            director_dense: Dense::glorot(shape.n_directors, DIRECTOR_UNITS, &mut rng),
            fusion_hidden: Dense::glorot(concat_dim, FUSION_UNITS[0], &mut rng),
            fusion_narrow: Dense::glorot(FUSION_UNITS[0], FUSION_UNITS[1], &mut rng),
            output: Dense::glorot(FUSION_UNITS[1], shape.n_items, &mut rng),
            origin: WeightsOrigin::Seeded(seed),
        }
    }

    /// Load weights written by `save` and check them against `expected`
    pub fn load<P: AsRef<Path>>(path: P, expected: ModelShape) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| RankerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut model: RankingModel = serde_json::from_str(&raw)?;

        if model.shape != expected {
            return Err(RankerError::ShapeMismatch {
                layer: "model".to_string(),
                expected: vec![
                    expected.n_genres,
                    expected.vocab_size,
                    expected.n_directors,
                    expected.n_items,
                ],
                actual: vec![
                    model.shape.n_genres,
                    model.shape.vocab_size,
                    model.shape.n_directors,
                    model.shape.n_items,
                ],
            });
        }
        model.validate()?;
        model.origin = WeightsOrigin::File(path.display().to_string());

        info!("Loaded ranking model weights from {}", path.display());
        Ok(model)
    }

    /// Load weights from `path` when given, otherwise initialise from `seed`.
    ///
    /// A configured file that doesn't exist falls back to seeded weights with
    /// a warning; a file that exists but doesn't fit the catalog is an error.
    pub fn load_or_initialize(path: Option<&Path>, shape: ModelShape, seed: u64) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p, shape),
            Some(p) => {
                warn!(
                    "Weights file {} not found, falling back to seeded weights",
                    p.display()
                );
                Ok(Self::initialize(shape, seed))
            }
            None => Ok(Self::initialize(shape, seed)),
        }
    }

    /// Write all parameters as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|source| RankerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved ranking model weights to {}", path.display());
        Ok(())
    }

    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    pub fn origin(&self) -> &WeightsOrigin {
        &self.origin
    }

    /// Seeded weights have never seen training data
    pub fn is_untrained(&self) -> bool {
        matches!(self.origin, WeightsOrigin::Seeded(_))
    }

    /// Total number of scalar parameters
    pub fn parameter_count(&self) -> usize {
        let dense = |d: &Dense| d.kernel.len() + d.bias.len();
        let lstm = |l: &Lstm| l.kernel.len() + l.recurrent_kernel.len() + l.bias.len();

        dense(&self.genre_dense)
            + self.embedding.table.len()
            + lstm(&self.text_lstm)
            + lstm(&self.text_lstm_last)
            + dense(&self.director_dense)
            + dense(&self.fusion_hidden)
            + dense(&self.fusion_narrow)
            + dense(&self.output)
    }

    /// Check every layer against the declared shape
    pub fn validate(&self) -> Result<()> {
        let s = self.shape;
        self.genre_dense.validate("genre_dense", s.n_genres, GENRE_UNITS)?;
        self.embedding.validate("embedding", s.vocab_size, EMBEDDING_DIM)?;
        self.text_lstm.validate("text_lstm", EMBEDDING_DIM, TEXT_LSTM_UNITS)?;
        self.text_lstm_last.validate("text_lstm_last", TEXT_LSTM_UNITS, TEXT_UNITS)?;
        self.director_dense.validate("director_dense", s.n_directors, DIRECTOR_UNITS)?;
        self.fusion_hidden.validate(
            "fusion_hidden",
            GENRE_UNITS + TEXT_UNITS + DIRECTOR_UNITS,
            FUSION_UNITS[0],
        )?;
        self.fusion_narrow.validate("fusion_narrow", FUSION_UNITS[0], FUSION_UNITS[1])?;
        self.output.validate("output", FUSION_UNITS[1], s.n_items)
    }

    /// Probability of every catalog movie given the query features.
    ///
    /// The result has `n_items` entries summing to 1.
    #[instrument(skip(self, features), fields(items = self.shape.n_items))]
    pub fn predict(&self, features: &QueryFeatures) -> Result<Array1<f32>> {
        self.check_input(features)?;

        let genre = self.genre_dense.forward_relu(features.genre.view());

        let embedded = self.embedding.lookup(&features.sequence)?;
        let sequence = self.text_lstm.forward_sequence(embedded.view());
        let text = self.text_lstm_last.forward_last(sequence.view());

        let director = self.director_dense.forward_relu(features.director.view());

        let merged = concatenate(Axis(0), &[genre.view(), text.view(), director.view()])
            .map_err(|e| RankerError::InvalidInput(format!("cannot merge branches: {}", e)))?;

        let hidden = self.fusion_hidden.forward_relu(merged.view());
        let narrow = self.fusion_narrow.forward_relu(hidden.view());
        let probabilities = softmax(&self.output.forward(narrow.view()));

        debug!("Scored {} items", probabilities.len());
        Ok(probabilities)
    }

    fn check_input(&self, features: &QueryFeatures) -> Result<()> {
        if features.genre.len() != self.shape.n_genres {
            return Err(RankerError::InvalidInput(format!(
                "genre vector has {} entries, model expects {}",
                features.genre.len(),
                self.shape.n_genres
            )));
        }
        if features.director.len() != self.shape.n_directors {
            return Err(RankerError::InvalidInput(format!(
                "director vector has {} entries, model expects {}",
                features.director.len(),
                self.shape.n_directors
            )));
        }
        if features.sequence.is_empty() {
            return Err(RankerError::InvalidInput(
                "overview sequence is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_shape() -> ModelShape {
        ModelShape {
            n_genres: 3,
            vocab_size: 12,
            n_directors: 2,
            n_items: 4,
        }
    }

    fn query() -> QueryFeatures {
        QueryFeatures {
            genre: Array1::from(vec![1.0, 0.0, 1.0]),
            sequence: vec![2, 5, 7, 1, 0, 0],
            director: Array1::from(vec![0.0, 1.0]),
        }
    }

    #[test]
    fn test_predict_is_a_distribution() {
        let model = RankingModel::initialize(small_shape(), 42);
        let scores = model.predict(&query()).unwrap();

        assert_eq!(scores.len(), 4);
        assert!((scores.sum() - 1.0).abs() < 1e-5);
        assert!(scores.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_same_seed_same_model() {
        let a = RankingModel::initialize(small_shape(), 42);
        let b = RankingModel::initialize(small_shape(), 42);
        let c = RankingModel::initialize(small_shape(), 43);

        assert_eq!(a, b);
        assert_ne!(a.predict(&query()).unwrap(), c.predict(&query()).unwrap());
    }

    #[test]
    fn test_wrong_input_width_rejected() {
        let model = RankingModel::initialize(small_shape(), 42);
        let mut features = query();
        features.genre = Array1::zeros(5);

        assert!(matches!(
            model.predict(&features),
            Err(RankerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let model = RankingModel::initialize(small_shape(), 42);
        let file = tempfile::NamedTempFile::new().unwrap();

        model.save(file.path()).unwrap();
        let loaded = RankingModel::load(file.path(), small_shape()).unwrap();

        assert!(!loaded.is_untrained());
        assert_eq!(
            model.predict(&query()).unwrap(),
            loaded.predict(&query()).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_other_catalog_shape() {
        let model = RankingModel::initialize(small_shape(), 42);
        let file = tempfile::NamedTempFile::new().unwrap();
        model.save(file.path()).unwrap();

        let other = ModelShape {
            n_items: 5,
            ..small_shape()
        };
        assert!(matches!(
            RankingModel::load(file.path(), other),
            Err(RankerError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_weights_file_falls_back_to_seed() {
        let model = RankingModel::load_or_initialize(
            Some(Path::new("/nonexistent/weights.json")),
            small_shape(),
            42,
        )
        .unwrap();
        assert_eq!(model.origin(), &WeightsOrigin::Seeded(42));
        assert!(model.validate().is_ok());
    }
}
