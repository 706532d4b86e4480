//! Error types for the data-loader crate.
//!
//! Rust error handling concepts demonstrated:
//! - thiserror for defining custom error types
//! - `#[from]` conversions so `?` works on csv and I/O errors
//! - Error messages with context

use thiserror::Error;

/// Errors that can occur while loading and parsing the movie catalog
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` based on our `#[error(...)]` attributes
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected the file (bad quoting, wrong header row...)
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A record in the catalog file couldn't be parsed
    #[error("Parse error at record {record} in {file}: {reason}")]
    ParseError {
        file: String,
        record: usize,
        reason: String,
    },

    /// The catalog contained no usable rows
    #[error("Catalog {path} contains no movies")]
    EmptyCatalog { path: String },
}

/// Convenience type alias for Results in this crate
///
/// Instead of writing `Result<T, DataLoadError>` everywhere,
/// we can write `Result<T>`
pub type Result<T> = std::result::Result<T, DataLoadError>;
