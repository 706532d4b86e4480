//! Parser for the IMDB Top-1000 catalog file.
//!
//! Header row:
//! `Poster_Link,Series_Title,Released_Year,Certificate,Runtime,Genre,IMDB_Rating,
//! Overview,Meta_score,Director,Star1,Star2,Star3,Star4,No_of_Votes,Gross`
//!
//! Fields are comma-separated and may be quoted (overviews contain commas,
//! gross values contain thousands separators). The csv crate handles the
//! quoting; this module turns each raw record into a `Movie`.

use crate::error::{DataLoadError, Result};
use crate::types::Movie;
use serde::Deserialize;
use std::io::Read;
use tracing::warn;

/// One row exactly as it appears in the file.
///
/// Every column is optional here; validation happens in `into_movie` so a
/// single malformed value doesn't reject the whole row.
#[derive(Debug, Deserialize)]
struct RawMovieRecord {
    #[serde(rename = "Poster_Link")]
    poster_link: Option<String>,
    #[serde(rename = "Series_Title")]
    series_title: Option<String>,
    #[serde(rename = "Released_Year")]
    released_year: Option<String>,
    #[serde(rename = "Certificate")]
    certificate: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "IMDB_Rating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Overview")]
    overview: Option<String>,
    #[serde(rename = "Meta_score")]
    meta_score: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Star1")]
    star1: Option<String>,
    #[serde(rename = "Star2")]
    star2: Option<String>,
    #[serde(rename = "Star3")]
    star3: Option<String>,
    #[serde(rename = "Star4")]
    star4: Option<String>,
    #[serde(rename = "No_of_Votes")]
    no_of_votes: Option<String>,
    #[serde(rename = "Gross")]
    gross: Option<String>,
}

impl RawMovieRecord {
    fn into_movie(self, file: &str, record: usize) -> Result<Movie> {
        let title = non_empty(self.series_title).ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            record,
            reason: "Missing Series_Title".to_string(),
        })?;

        Ok(Movie {
            title,
            genres: parse_genres(self.genre.as_deref().unwrap_or("")),
            director: non_empty(self.director).unwrap_or_default(),
            overview: non_empty(self.overview).unwrap_or_default(),
            poster_link: non_empty(self.poster_link),
            released_year: parse_number(self.released_year.as_deref()),
            certificate: non_empty(self.certificate),
            runtime: non_empty(self.runtime),
            imdb_rating: parse_float(self.imdb_rating.as_deref()),
            meta_score: parse_float(self.meta_score.as_deref()),
            star1: non_empty(self.star1),
            star2: non_empty(self.star2),
            star3: non_empty(self.star3),
            star4: non_empty(self.star4),
            no_of_votes: parse_number(self.no_of_votes.as_deref()),
            gross: parse_number(self.gross.as_deref()),
        })
    }
}

/// Parse a catalog from any reader producing CSV text.
///
/// Rows without a title are skipped with a warning; CSV-level errors
/// (unbalanced quotes, wrong field count) abort the load.
pub fn parse_movies<R: Read>(reader: R, file: &str) -> Result<Vec<Movie>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut movies = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in csv_reader.deserialize::<RawMovieRecord>().enumerate() {
        // Record numbers are 1-based and don't count the header row
        let record_no = idx + 1;
        let raw = result?;

        match raw.into_movie(file, record_no) {
            Ok(movie) => movies.push(movie),
            Err(e) => {
                warn!("Skipping catalog record: {}", e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed records in {}", skipped, file);
    }
    Ok(movies)
}

/// Split a comma-separated genre field
///
/// Example: "Crime, Drama" -> vec!["Crime", "Drama"]
///          ""             -> vec![]
pub fn parse_genres(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treat empty / whitespace-only cells as missing
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an integer column, tolerating thousands separators
///
/// Example: "28,341,469" -> Some(28341469)
///          "PG"         -> None
fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    let cleaned: String = value?.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse().ok()
}

/// Parse a float column; NaN and infinities count as missing
fn parse_float(value: Option<&str>) -> Option<f64> {
    parse_number::<f64>(value).filter(|v| v.is_finite())
}
