//! The scoring seam between the recommendation engine and the model.

use crate::error::{RankerError, Result};
use crate::model::RankingModel;
use ndarray::Array1;
use pipeline::QueryFeatures;

/// Scores every catalog movie for one query movie.
///
/// ## Design Note
/// - `Send + Sync` so one scorer can be shared by all request handlers
/// - `score` takes `&self`: scoring never mutates the scorer
/// - Implementations must return exactly one score per catalog movie
pub trait Scorer: Send + Sync {
    /// Returns the name of this scorer (for logging/debugging)
    fn name(&self) -> &str;

    /// Number of catalog movies this scorer produces scores for
    fn n_items(&self) -> usize;

    /// One score per catalog movie, in catalog order
    fn score(&self, features: &QueryFeatures) -> Result<Array1<f32>>;
}

impl Scorer for RankingModel {
    fn name(&self) -> &str {
        "ranking_model"
    }

    fn n_items(&self) -> usize {
        self.shape().n_items
    }

    fn score(&self, features: &QueryFeatures) -> Result<Array1<f32>> {
        self.predict(features)
    }
}

/// Gives every movie the same score `1/N`, leaving similarity to decide the
/// order. Used by tests and as a similarity-only mode.
#[derive(Debug, Clone, Copy)]
pub struct UniformScorer {
    n_items: usize,
}

impl UniformScorer {
    pub fn new(n_items: usize) -> Self {
        Self { n_items }
    }
}

impl Scorer for UniformScorer {
    fn name(&self) -> &str {
        "uniform"
    }

    fn n_items(&self) -> usize {
        self.n_items
    }

    fn score(&self, _features: &QueryFeatures) -> Result<Array1<f32>> {
        if self.n_items == 0 {
            return Err(RankerError::InvalidInput(
                "cannot score an empty catalog".to_string(),
            ));
        }
        Ok(Array1::from_elem(self.n_items, 1.0 / self.n_items as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelShape;

    fn query() -> QueryFeatures {
        QueryFeatures {
            genre: Array1::from(vec![1.0, 0.0]),
            sequence: vec![2, 3, 0],
            director: Array1::from(vec![1.0]),
        }
    }

    #[test]
    fn test_uniform_scores() {
        let scorer = UniformScorer::new(4);
        let scores = scorer.score(&query()).unwrap();
        assert_eq!(scores.to_vec(), vec![0.25; 4]);
        assert_eq!(scorer.name(), "uniform");
    }

    #[test]
    fn test_scorers_behind_trait_object() {
        let shape = ModelShape {
            n_genres: 2,
            vocab_size: 4,
            n_directors: 1,
            n_items: 3,
        };
        let scorers: Vec<Box<dyn Scorer>> = vec![
            Box::new(UniformScorer::new(3)),
            Box::new(RankingModel::initialize(shape, 1)),
        ];

        for scorer in &scorers {
            let scores = scorer.score(&query()).unwrap();
            assert_eq!(scores.len(), scorer.n_items());
            assert!((scores.sum() - 1.0).abs() < 1e-5, "{} not normalised", scorer.name());
        }
    }
}
