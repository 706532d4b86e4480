//! Catalog loading and title search.
//!
//! This module builds the Catalog from the CSV file:
//! - Parse the file into movies (file order preserved)
//! - Build the case-insensitive title index
//! - Report duplicate titles, which can only be addressed by their first row

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

impl Catalog {
    /// Load the movie catalog from a CSV file
    ///
    /// This is the main entry point for loading data.
    ///
    /// Steps:
    /// 1. Open the file (missing file -> `FileNotFound`)
    /// 2. Parse every record into a `Movie`
    /// 3. Build the title index
    /// 4. Reject an empty catalog
    pub fn load_from_csv(path: &Path) -> Result<Self> {
        info!("Loading movie catalog from {:?}", path);

        let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let movies = parser::parse_movies(file, &file_name)?;
        if movies.is_empty() {
            return Err(DataLoadError::EmptyCatalog {
                path: path.display().to_string(),
            });
        }

        let catalog = Catalog::from_movies(movies);

        let duplicates = catalog.duplicate_titles();
        if !duplicates.is_empty() {
            warn!(
                "{} titles appear more than once; lookups use the first occurrence: {:?}",
                duplicates.len(),
                duplicates
            );
        }

        info!("Loaded {} movies", catalog.len());
        Ok(catalog)
    }

    /// Titles (lowercased) that occur on more than one row
    pub fn duplicate_titles(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for movie in &self.movies {
            let key = movie.title_key();
            if !seen.insert(key.clone()) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }

    /// Search titles by case-insensitive substring
    ///
    /// Exact matches come first, then substring matches; within each group
    /// higher IMDB rating first, then catalog order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(RowIndex, &Movie)> {
        let query = normalize_title(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, RowIndex, &Movie)> = self
            .movies
            .iter()
            .enumerate()
            .filter_map(|(idx, movie)| {
                let key = movie.title_key();
                if key == query {
                    Some((0, idx, movie))
                } else if key.contains(&query) {
                    Some((1, idx, movie))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| {
                    let ra = a.2.imdb_rating.unwrap_or(0.0);
                    let rb = b.2.imdb_rating.unwrap_or(0.0);
                    rb.total_cmp(&ra)
                })
                .then_with(|| a.1.cmp(&b.1))
        });

        matches
            .into_iter()
            .take(limit)
            .map(|(_, idx, movie)| (idx, movie))
            .collect()
    }
}
