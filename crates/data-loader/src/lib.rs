//! # Data Loader Crate
//!
//! This crate loads the IMDB Top-1000 movie catalog and indexes it by title.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Catalog)
//! - **parser**: Parse CSV records into Rust structs
//! - **index**: Load the catalog from disk, title search
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_csv(Path::new("data/imdb_top_1000.csv"))?;
//!
//! // Row order is file order; titles resolve case-insensitively
//! let idx = catalog.find_index("the dark knight").unwrap();
//! let movie = catalog.get(idx).unwrap();
//! println!("{} directed by {}", movie.title, movie.director);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{normalize_title, Catalog, Movie, RowIndex};

#[cfg(test)]
mod tests {
    use super::*;

    fn drama(title: &str) -> Movie {
        Movie::new(title, vec!["Drama".to_string()], "Frank Darabont", "Two men bond.")
    }

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::default();
        assert_eq!(catalog.len(), 0);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let catalog = Catalog::from_movies(vec![drama("The Shawshank Redemption"), drama("The Green Mile")]);

        assert_eq!(catalog.find_index("the shawshank redemption"), Some(0));
        assert_eq!(catalog.find_index("THE GREEN MILE"), Some(1));
        assert_eq!(
            catalog.find_by_title("The Green Mile").map(|m| m.title.as_str()),
            Some("The Green Mile")
        );
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::from_movies(vec![drama("The Green Mile")]);

        // Querying non-existent data should return None
        assert!(catalog.find_index("Unknown Movie").is_none());
        assert!(catalog.find_by_title("").is_none());
        assert!(catalog.get(5).is_none());
    }
}
