//! Core domain types for the movie catalog.
//!
//! This module defines the fundamental data structures used throughout the system.
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (RowIndex)
//! - Structs with public fields and `Option<T>` for missing values
//! - Derive macros for common traits
//! - A Vec for ordered storage plus a HashMap for case-insensitive lookups

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Position of a movie in the catalog (0-based, file order).
///
/// Every matrix built from the catalog (features, similarity, model output)
/// uses this same index for its rows/columns.
pub type RowIndex = usize;

// =============================================================================
// Movie
// =============================================================================

/// One catalog entry.
///
/// Only `title`, `genres`, `director` and `overview` feed the recommender.
/// The remaining fields are display attributes carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Public key of the movie; lookups ignore case
    pub title: String,
    /// Genres, already split on `,` and trimmed
    pub genres: Vec<String>,
    pub director: String,
    pub overview: String,

    pub poster_link: Option<String>,
    /// Release year
    ///
    /// Rust concept: `Option<T>` represents a value that may or may not exist
    /// - `Some(1994)` when the source column held a number
    /// - `None` when it was empty or not numeric
    pub released_year: Option<u16>,
    pub certificate: Option<String>,
    /// Runtime as written in the source, e.g. "142 min"
    pub runtime: Option<String>,
    pub imdb_rating: Option<f64>,
    pub meta_score: Option<f64>,
    pub star1: Option<String>,
    pub star2: Option<String>,
    pub star3: Option<String>,
    pub star4: Option<String>,
    pub no_of_votes: Option<u64>,
    pub gross: Option<u64>,
}

impl Movie {
    /// Create a movie with only the attributes the recommender reads.
    ///
    /// Handy for tests and fixtures; display attributes start out empty.
    pub fn new(
        title: impl Into<String>,
        genres: Vec<String>,
        director: impl Into<String>,
        overview: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            genres,
            director: director.into(),
            overview: overview.into(),
            poster_link: None,
            released_year: None,
            certificate: None,
            runtime: None,
            imdb_rating: None,
            meta_score: None,
            star1: None,
            star2: None,
            star3: None,
            star4: None,
            no_of_votes: None,
            gross: None,
        }
    }

    /// Lowercased title, the key used by the catalog's title index
    pub fn title_key(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Normalize a title for case-insensitive lookups
pub fn normalize_title(title: &str) -> String {
    title.to_lowercase()
}

// =============================================================================
// Catalog - The Core In-Memory Store
// =============================================================================

/// Ordered, immutable collection of movies.
///
/// Rows keep their file order because every derived matrix is indexed by row.
/// Titles are not guaranteed unique (case-insensitively); the title index
/// points at the FIRST row carrying a given title.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) movies: Vec<Movie>,
    /// lowercase title -> first row with that title
    pub(crate) title_index: HashMap<String, RowIndex>,
}

impl Catalog {
    /// Build a catalog from movies in their final order
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let mut title_index = HashMap::with_capacity(movies.len());
        for (idx, movie) in movies.iter().enumerate() {
            // Entry API: only the first occurrence of a title is indexed
            title_index.entry(movie.title_key()).or_insert(idx);
        }
        Self {
            movies,
            title_index,
        }
    }

    /// Number of movies in the catalog
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// All movies in row order
    ///
    /// Rust concept: `&[T]` is a slice (view into the Vec)
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Get a movie by row index
    pub fn get(&self, idx: RowIndex) -> Option<&Movie> {
        self.movies.get(idx)
    }

    /// Resolve a title to its row, ignoring case
    pub fn find_index(&self, title: &str) -> Option<RowIndex> {
        self.title_index.get(&normalize_title(title)).copied()
    }

    /// Resolve a title to its movie, ignoring case
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.find_index(title).and_then(|idx| self.movies.get(idx))
    }
}
