//! Content-similarity matrix over the whole catalog.
//!
//! ## Algorithm
//! 1. Cosine similarity inside each feature space:
//!    - dense spaces (genre, director): L2-normalise the rows, then `X · Xᵀ`
//!    - sparse TF-IDF space: rows are already unit length, so walk an inverted
//!      index (term -> rows containing it) and accumulate dot products, one
//!      row per rayon task
//! 2. Symmetrise each result as `(S + Sᵀ) / 2` so float noise can't make
//!    `M[i][j]` and `M[j][i]` disagree
//! 3. Combine: `M = w_genre * G + w_overview * O + w_director * D`
//!
//! A movie whose feature row is all zeros has similarity 0 to everyone in that
//! space (no NaN from dividing by a zero norm).
//!
//! ## Scaling
//! The matrix is dense `N x N` f32: 1,000 movies cost ~4 MB, 100,000 movies
//! would cost ~40 GB. The footprint is logged at build time.

use crate::error::SimilarityError;
use crate::tfidf::SparseMatrix;
use data_loader::RowIndex;
use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, instrument};

const WEIGHT_TOLERANCE: f32 = 1e-6;

/// Contribution of each feature space to the combined similarity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub genre: f32,
    pub overview: f32,
    pub director: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            genre: 0.15,
            overview: 0.75,
            director: 0.10,
        }
    }
}

impl SimilarityWeights {
    /// Fails unless the weights sum to 1
    pub fn validate(&self) -> Result<(), SimilarityError> {
        let sum = self.genre + self.overview + self.director;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(SimilarityError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Dense symmetric `N x N` similarity matrix
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    values: Array2<f32>,
}

impl SimilarityMatrix {
    /// Number of movies (rows == columns)
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Similarities of movie `i` to every movie
    pub fn row(&self, i: RowIndex) -> ArrayView1<'_, f32> {
        self.values.row(i)
    }

    pub fn get(&self, i: RowIndex, j: RowIndex) -> f32 {
        self.values[[i, j]]
    }

    /// Memory held by the matrix values
    pub fn size_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f32>()
    }
}

/// Build the combined similarity matrix.
///
/// `genre` and `director` are the dense multi-hot / one-hot matrices,
/// `overview` the L2-normalised TF-IDF rows. All three must have one row per
/// catalog movie.
#[instrument(skip_all, fields(movies = genre.nrows()))]
pub fn build_similarity(
    genre: &Array2<f32>,
    overview: &SparseMatrix,
    director: &Array2<f32>,
    weights: &SimilarityWeights,
) -> Result<SimilarityMatrix, SimilarityError> {
    weights.validate()?;

    let n = genre.nrows();
    if overview.n_rows() != n || director.nrows() != n {
        return Err(SimilarityError::RowCountMismatch {
            genre: n,
            overview: overview.n_rows(),
            director: director.nrows(),
        });
    }

    let start = Instant::now();

    let genre_sim = dense_cosine(genre);
    let overview_sim = sparse_cosine(overview);
    let director_sim = dense_cosine(director);

    let values = genre_sim * weights.genre
        + overview_sim * weights.overview
        + director_sim * weights.director;

    let matrix = SimilarityMatrix { values };
    info!(
        "Built {}x{} similarity matrix ({:.1} MB) in {:?}",
        n,
        n,
        matrix.size_bytes() as f64 / (1024.0 * 1024.0),
        start.elapsed()
    );

    Ok(matrix)
}

/// Cosine similarity between every pair of rows of a dense matrix
pub fn dense_cosine(features: &Array2<f32>) -> Array2<f32> {
    let mut normalized = features.clone();
    for mut row in normalized.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }

    let gram = normalized.dot(&normalized.t());
    symmetrize(gram)
}

/// Cosine similarity between every pair of L2-normalised sparse rows
pub fn sparse_cosine(features: &SparseMatrix) -> Array2<f32> {
    let n = features.n_rows();

    // Rust concept: the inverted index is built once and shared read-only
    // across rayon workers, no locking needed.
    let mut postings: Vec<Vec<(usize, f32)>> = vec![Vec::new(); features.n_cols];
    for (row_idx, row) in features.rows.iter().enumerate() {
        for (&col, &value) in row.indices.iter().zip(&row.values) {
            postings[col].push((row_idx, value));
        }
    }

    let rows: Vec<Vec<f32>> = features
        .rows
        .par_iter()
        .map(|row| {
            let mut acc = vec![0.0f32; n];
            for (&col, &value) in row.indices.iter().zip(&row.values) {
                for &(other, other_value) in &postings[col] {
                    acc[other] += value * other_value;
                }
            }
            acc
        })
        .collect();

    let mut result = Array2::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, v) in row.into_iter().enumerate() {
            result[[i, j]] = v;
        }
    }
    symmetrize(result)
}

fn symmetrize(matrix: Array2<f32>) -> Array2<f32> {
    let transposed = matrix.t().to_owned();
    (matrix + transposed) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfidf::SparseVector;
    use ndarray::array;

    fn sparse(rows: Vec<Vec<(usize, f32)>>, n_cols: usize) -> SparseMatrix {
        SparseMatrix {
            rows: rows
                .into_iter()
                .map(|r| SparseVector {
                    indices: r.iter().map(|(i, _)| *i).collect(),
                    values: r.iter().map(|(_, v)| *v).collect(),
                })
                .collect(),
            n_cols,
        }
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(SimilarityWeights::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let weights = SimilarityWeights {
            genre: 0.5,
            overview: 0.5,
            director: 0.5,
        };
        assert!(matches!(
            weights.validate(),
            Err(SimilarityError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_dense_cosine_zero_row() {
        let m = array![[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let sim = dense_cosine(&m);

        assert!((sim[[0, 0]] - 1.0).abs() < 1e-6);
        assert!((sim[[0, 1]] - 1.0 / 2.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(sim[[2, 0]], 0.0);
        assert_eq!(sim[[2, 2]], 0.0);
    }

    #[test]
    fn test_sparse_cosine_matches_dot() {
        let s = 1.0 / 2.0f32.sqrt();
        let m = sparse(vec![vec![(0, 1.0)], vec![(0, s), (2, s)], vec![]], 3);
        let sim = sparse_cosine(&m);

        assert!((sim[[0, 1]] - s).abs() < 1e-6);
        assert!((sim[[1, 1]] - 1.0).abs() < 1e-6);
        assert_eq!(sim[[2, 1]], 0.0);
    }

    #[test]
    fn test_combined_matrix_is_symmetric() {
        let genre = array![[1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let director = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let overview = sparse(vec![vec![(0, 0.6), (1, 0.8)], vec![(1, 1.0)], vec![(0, 1.0)]], 2);

        let sim =
            build_similarity(&genre, &overview, &director, &SimilarityWeights::default()).unwrap();
        assert_eq!(sim.len(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(sim.get(i, j), sim.get(j, i));
            }
        }
    }

    #[test]
    fn test_each_space_contributes_its_weight() {
        // Row 0 shares genre with row 1, director with row 2 and overview with row 3
        let genre = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let director = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let overview = sparse(
            vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(2, 1.0)], vec![(0, 1.0)]],
            3,
        );

        let sim =
            build_similarity(&genre, &overview, &director, &SimilarityWeights::default()).unwrap();
        assert!((sim.get(0, 0) - 1.0).abs() < 1e-6);
        assert!((sim.get(0, 1) - 0.15).abs() < 1e-6);
        assert!((sim.get(0, 2) - 0.10).abs() < 1e-6);
        assert!((sim.get(0, 3) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_row_count_mismatch() {
        let genre = array![[1.0], [1.0]];
        let director = array![[1.0]];
        let overview = sparse(vec![vec![], vec![]], 1);

        let result = build_similarity(&genre, &overview, &director, &SimilarityWeights::default());
        assert!(matches!(result, Err(SimilarityError::RowCountMismatch { .. })));
    }
}
