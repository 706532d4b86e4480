//! # Recommendation Engine
//!
//! This module turns one or more query titles into ranked catalog movies:
//! 1. Resolve the title to a catalog row (case-insensitive, first occurrence)
//! 2. Encode the query movie's features
//! 3. Score every catalog movie with the ranking model
//! 4. Blend: `0.99 * model score + 0.01 * content similarity`
//! 5. Exclude the query movie(s)
//! 6. Take the top K (descending score, ties by catalog order)
//!
//! The `Recommender` owns everything built at startup (catalog, encoding
//! tables, similarity matrix, scorer). It is immutable afterwards and is
//! shared behind an `Arc` by every request; tests build their own instances.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array1, ArrayView1};
use tracing::{debug, info, instrument, warn};

use data_loader::{Catalog, Movie, RowIndex};
use pipeline::{
    build_similarity, encode_catalog, EncoderConfig, EncodingTables, SimilarityMatrix,
    SimilarityWeights,
};
use ranker::{ModelShape, RankingModel, Scorer, UniformScorer};

use crate::error::{RecommendError, Result};

/// Upper bound on titles per `recommend_many` call
pub const MAX_BATCH_TITLES: usize = 5;

/// Default number of recommendations per title
pub const DEFAULT_TOP_K: usize = 5;

/// Outcome for one title of a batch: a list, or why there is none
pub type TitleRecommendations = Result<Vec<Movie>>;

/// How model scores and content similarity are mixed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendPolicy {
    pub model_weight: f32,
    pub similarity_weight: f32,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            model_weight: 0.99,
            similarity_weight: 0.01,
        }
    }
}

/// Which scorer backs the recommender
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerKind {
    /// The neural ranking model, from a weights file or a seed
    Model {
        seed: u64,
        weights_path: Option<PathBuf>,
    },
    /// Equal scores for every movie; similarity alone decides the order
    Uniform,
}

/// Everything needed to build a `Recommender` from a catalog
#[derive(Debug, Clone)]
pub struct RecommenderSettings {
    pub encoder: EncoderConfig,
    pub similarity: SimilarityWeights,
    pub blend: BlendPolicy,
    pub scorer: ScorerKind,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            similarity: SimilarityWeights::default(),
            blend: BlendPolicy::default(),
            scorer: ScorerKind::Model {
                seed: 42,
                weights_path: None,
            },
        }
    }
}

pub struct Recommender {
    catalog: Arc<Catalog>,
    tables: EncodingTables,
    similarity: SimilarityMatrix,
    scorer: Arc<dyn Scorer>,
    blend: BlendPolicy,
}

impl Recommender {
    /// Assemble a recommender from already-built parts.
    ///
    /// Fails if the similarity matrix or the scorer don't cover exactly the
    /// catalog's rows.
    pub fn new(
        catalog: Arc<Catalog>,
        tables: EncodingTables,
        similarity: SimilarityMatrix,
        scorer: Arc<dyn Scorer>,
        blend: BlendPolicy,
    ) -> Result<Self> {
        let n = catalog.len();
        if similarity.len() != n {
            return Err(RecommendError::Internal(format!(
                "similarity matrix covers {} movies, catalog has {}",
                similarity.len(),
                n
            )));
        }
        if scorer.n_items() != n {
            return Err(RecommendError::Internal(format!(
                "scorer '{}' covers {} movies, catalog has {}",
                scorer.name(),
                scorer.n_items(),
                n
            )));
        }

        Ok(Self {
            catalog,
            tables,
            similarity,
            scorer,
            blend,
        })
    }

    /// Run the whole startup pipeline: encode, build similarity, load or
    /// initialise the scorer.
    ///
    /// CPU-heavy; callers on an async runtime should run it in
    /// `spawn_blocking`.
    pub fn build(catalog: Catalog, settings: &RecommenderSettings) -> Result<Self> {
        let start = Instant::now();

        let (encoded, tables) = encode_catalog(&catalog, &settings.encoder)?;
        let similarity = build_similarity(
            &encoded.genre_matrix,
            &encoded.tfidf_matrix,
            &encoded.director_matrix,
            &settings.similarity,
        )?;

        let scorer: Arc<dyn Scorer> = match &settings.scorer {
            ScorerKind::Model { seed, weights_path } => {
                let shape = ModelShape::from_tables(&tables, catalog.len());
                let model =
                    RankingModel::load_or_initialize(weights_path.as_deref(), shape, *seed)?;
                if model.is_untrained() {
                    warn!(
                        "Serving an untrained ranking model (seed {}); recommendations are driven by random weights",
                        seed
                    );
                }
                info!("Ranking model ready: {} parameters", model.parameter_count());
                Arc::new(model)
            }
            ScorerKind::Uniform => Arc::new(UniformScorer::new(catalog.len())),
        };

        let recommender = Self::new(
            Arc::new(catalog),
            tables,
            similarity,
            scorer,
            settings.blend,
        )?;

        info!(
            "Recommender ready with {} movies using '{}' scorer in {:.2?}",
            recommender.catalog.len(),
            recommender.scorer.name(),
            start.elapsed()
        );
        Ok(recommender)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tables(&self) -> &EncodingTables {
        &self.tables
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Recommendations for a single title; the title itself is never returned
    #[instrument(skip(self))]
    pub fn recommend_one(&self, title: &str, top_k: usize) -> Result<Vec<Movie>> {
        let idx = self.resolve(title)?;
        self.recommend_for_row(idx, &[idx], top_k)
    }

    /// Recommendations for 1 to `MAX_BATCH_TITLES` titles.
    ///
    /// No query title of the batch appears in any title's list. A title that
    /// doesn't resolve gets a `NotFound` entry without failing the batch;
    /// other failures abort the whole call. Output follows input order.
    #[instrument(skip(self, titles), fields(titles = titles.len()))]
    pub fn recommend_many(
        &self,
        titles: &[String],
        top_k: usize,
    ) -> Result<Vec<(String, TitleRecommendations)>> {
        if titles.is_empty() || titles.len() > MAX_BATCH_TITLES {
            return Err(RecommendError::InvalidInput(format!(
                "Please provide between 1 and {} movie titles",
                MAX_BATCH_TITLES
            )));
        }

        let resolved: Vec<Option<RowIndex>> = titles
            .iter()
            .map(|t| self.catalog.find_index(t))
            .collect();
        let excluded: Vec<RowIndex> = resolved.iter().flatten().copied().collect();

        let mut results = Vec::with_capacity(titles.len());
        for (title, idx) in titles.iter().zip(resolved) {
            let entry = match idx {
                Some(idx) => Ok(self.recommend_for_row(idx, &excluded, top_k)?),
                None => {
                    debug!("Batch title '{}' not found", title);
                    Err(RecommendError::NotFound(title.clone()))
                }
            };
            results.push((title.clone(), entry));
        }

        Ok(results)
    }

    fn resolve(&self, title: &str) -> Result<RowIndex> {
        self.catalog
            .find_index(title)
            .ok_or_else(|| RecommendError::NotFound(title.to_string()))
    }

    fn recommend_for_row(
        &self,
        idx: RowIndex,
        excluded: &[RowIndex],
        top_k: usize,
    ) -> Result<Vec<Movie>> {
        let start = Instant::now();
        let movie = self
            .catalog
            .get(idx)
            .ok_or_else(|| RecommendError::Internal(format!("row {} outside catalog", idx)))?;

        let features = self.tables.query_features(movie)?;
        let scores = self.scorer.score(&features)?;
        if scores.len() != self.catalog.len() {
            return Err(RecommendError::Internal(format!(
                "scorer returned {} scores for {} movies",
                scores.len(),
                self.catalog.len()
            )));
        }

        let combined = self.blend_scores(&scores, self.similarity.row(idx));
        let top = select_top_k(combined.view(), top_k, excluded);

        debug!(
            "Ranked {} movies for '{}' in {:.2?}",
            combined.len(),
            movie.title,
            start.elapsed()
        );

        Ok(top
            .into_iter()
            .filter_map(|i| self.catalog.get(i).cloned())
            .collect())
    }

    fn blend_scores(&self, scores: &Array1<f32>, similarity: ArrayView1<f32>) -> Array1<f32> {
        let BlendPolicy {
            model_weight,
            similarity_weight,
        } = self.blend;
        Array1::from_shape_fn(scores.len(), |j| {
            model_weight * scores[j] + similarity_weight * similarity[j]
        })
    }
}

/// Indices of the `k` highest scores, skipping `excluded`.
///
/// Descending by score; equal scores keep catalog order. NaN sorts below
/// every real score.
pub fn select_top_k(scores: ArrayView1<f32>, k: usize, excluded: &[RowIndex]) -> Vec<RowIndex> {
    let mut candidates: Vec<RowIndex> = (0..scores.len())
        .filter(|i| !excluded.contains(i))
        .collect();

    candidates.sort_by(|&a, &b| {
        rank_key(scores[b])
            .total_cmp(&rank_key(scores[a]))
            .then_with(|| a.cmp(&b))
    });
    candidates.truncate(k);
    candidates
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("movies", &self.catalog.len())
            .field("scorer", &self.scorer.name())
            .field("blend", &self.blend)
            .finish()
    }
}
