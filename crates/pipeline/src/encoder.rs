//! Feature encoding for the whole catalog.
//!
//! Turns every movie into:
//! - a multi-hot genre row
//! - a fixed-length overview id sequence (ranking model input)
//! - a one-hot director row
//! - an L2-normalised TF-IDF overview row (similarity input)
//!
//! The fitted vocabularies are returned as `EncodingTables` so single movies
//! can be encoded the same way at request time.

use crate::category::CategoryIndex;
use crate::error::EncodeError;
use crate::tfidf::{SparseMatrix, TfidfVectorizer};
use crate::tokenizer::TextTokenizer;
use data_loader::{Catalog, Movie};
use ndarray::{Array1, Array2};
use tracing::{debug, info, instrument};

/// Fixed length of overview id sequences
pub const SEQUENCE_LENGTH: usize = 200;

/// Vocabulary cap of the ranking model's tokenizer
pub const DEFAULT_MAX_WORDS: usize = 10_000;

/// Vocabulary cap of the TF-IDF space
pub const DEFAULT_MAX_TFIDF_FEATURES: usize = 5_000;

/// Knobs for vocabulary sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderConfig {
    pub max_words: usize,
    pub max_tfidf_features: usize,
    pub sequence_length: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            max_tfidf_features: DEFAULT_MAX_TFIDF_FEATURES,
            sequence_length: SEQUENCE_LENGTH,
        }
    }
}

/// The three ranking-model inputs for one movie
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFeatures {
    pub genre: Array1<f32>,
    pub sequence: Vec<u32>,
    pub director: Array1<f32>,
}

/// Per-catalog feature matrices; row `i` belongs to catalog row `i`
#[derive(Debug, Clone)]
pub struct EncodedCatalog {
    pub genre_matrix: Array2<f32>,
    pub text_sequences: Array2<u32>,
    pub director_matrix: Array2<f32>,
    pub tfidf_matrix: SparseMatrix,
}

/// Vocabularies fitted on the catalog. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingTables {
    pub genres: CategoryIndex,
    pub directors: CategoryIndex,
    pub tokenizer: TextTokenizer,
    pub tfidf: TfidfVectorizer,
    pub sequence_length: usize,
}

impl EncodingTables {
    /// Fit every vocabulary on the catalog
    pub fn fit(catalog: &Catalog, config: &EncoderConfig) -> Result<Self, EncodeError> {
        if catalog.is_empty() {
            return Err(EncodeError::EmptyCatalog);
        }
        let movies = catalog.movies();
        let overviews: Vec<&str> = movies.iter().map(|m| m.overview.as_str()).collect();

        Ok(Self {
            genres: CategoryIndex::fit("genre", movies.iter().flat_map(|m| m.genres.iter())),
            directors: CategoryIndex::fit("director", movies.iter().map(|m| m.director.as_str())),
            tokenizer: TextTokenizer::fit(&overviews, config.max_words),
            tfidf: TfidfVectorizer::fit(&overviews, config.max_tfidf_features),
            sequence_length: config.sequence_length,
        })
    }

    pub fn genre_vector(&self, genres: &[String]) -> Array1<f32> {
        self.genres.multi_hot(genres)
    }

    pub fn director_vector(&self, director: &str) -> Result<Array1<f32>, EncodeError> {
        self.directors.one_hot(director)
    }

    pub fn text_sequence(&self, overview: &str) -> Vec<u32> {
        self.tokenizer.encode_padded(overview, self.sequence_length)
    }

    /// Ranking-model inputs for one movie
    pub fn query_features(&self, movie: &Movie) -> Result<QueryFeatures, EncodeError> {
        Ok(QueryFeatures {
            genre: self.genre_vector(&movie.genres),
            sequence: self.text_sequence(&movie.overview),
            director: self.director_vector(&movie.director)?,
        })
    }

    /// Encode every movie of a catalog with these tables
    pub fn transform(&self, catalog: &Catalog) -> Result<EncodedCatalog, EncodeError> {
        let movies = catalog.movies();

        let genres: Vec<&[String]> = movies.iter().map(|m| m.genres.as_slice()).collect();
        let genre_matrix = self.genres.multi_hot_matrix(&genres);

        let directors: Vec<&str> = movies.iter().map(|m| m.director.as_str()).collect();
        let director_matrix = self.directors.one_hot_matrix(&directors)?;

        let mut text_sequences = Array2::zeros((movies.len(), self.sequence_length));
        for (r, movie) in movies.iter().enumerate() {
            let sequence = Array1::from(self.text_sequence(&movie.overview));
            text_sequences.row_mut(r).assign(&sequence);
        }

        let overviews: Vec<&str> = movies.iter().map(|m| m.overview.as_str()).collect();
        let tfidf_matrix = self.tfidf.transform_all(&overviews);

        Ok(EncodedCatalog {
            genre_matrix,
            text_sequences,
            director_matrix,
            tfidf_matrix,
        })
    }
}

/// Fit the encoding tables on a catalog and encode every movie.
///
/// Deterministic: the same catalog always yields equal tables and matrices.
#[instrument(skip(catalog, config), fields(movies = catalog.len()))]
pub fn encode_catalog(
    catalog: &Catalog,
    config: &EncoderConfig,
) -> Result<(EncodedCatalog, EncodingTables), EncodeError> {
    let tables = EncodingTables::fit(catalog, config)?;
    let encoded = tables.transform(catalog)?;

    info!(
        "Encoded {} movies: {} genres, {} directors, {} token ids, {} tf-idf terms",
        catalog.len(),
        tables.genres.len(),
        tables.directors.len(),
        tables.tokenizer.vocab_size(),
        tables.tfidf.n_features()
    );
    debug!("Genre vocabulary: {:?}", tables.genres.labels());

    Ok((encoded, tables))
}
