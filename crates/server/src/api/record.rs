//! JSON shape of a movie as served by the HTTP API.
//!
//! Field names follow the catalog's CSV columns. Absent, empty and non-finite
//! values are left out of the record instead of being serialised as null.

use data_loader::Movie;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("movie has a blank title")]
    BlankTitle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Lowercased title with spaces replaced by hyphens
    pub id: String,

    #[serde(rename = "Series_Title")]
    pub series_title: String,

    #[serde(rename = "Poster_Link", default, skip_serializing_if = "Option::is_none")]
    pub poster_link: Option<String>,

    #[serde(rename = "Released_Year", default, skip_serializing_if = "Option::is_none")]
    pub released_year: Option<u16>,

    #[serde(rename = "Certificate", default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(rename = "Runtime", default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(rename = "Genre", default, skip_serializing_if = "Vec::is_empty")]
    pub genre: Vec<String>,

    #[serde(rename = "IMDB_Rating", default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,

    #[serde(rename = "Overview", default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,

    #[serde(rename = "Meta_score", default, skip_serializing_if = "Option::is_none")]
    pub meta_score: Option<f64>,

    #[serde(rename = "Director", default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,

    #[serde(rename = "Star1", default, skip_serializing_if = "Option::is_none")]
    pub star1: Option<String>,

    #[serde(rename = "Star2", default, skip_serializing_if = "Option::is_none")]
    pub star2: Option<String>,

    #[serde(rename = "Star3", default, skip_serializing_if = "Option::is_none")]
    pub star3: Option<String>,

    #[serde(rename = "Star4", default, skip_serializing_if = "Option::is_none")]
    pub star4: Option<String>,

    #[serde(rename = "No_of_Votes", default, skip_serializing_if = "Option::is_none")]
    pub no_of_votes: Option<u64>,

    #[serde(rename = "Gross", default, skip_serializing_if = "Option::is_none")]
    pub gross: Option<u64>,
}

/// URL-friendly id derived from a title
pub fn slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(text)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl TryFrom<&Movie> for MovieRecord {
    type Error = RecordError;

    fn try_from(movie: &Movie) -> Result<Self, Self::Error> {
        let title = text(&movie.title).ok_or(RecordError::BlankTitle)?;

        Ok(Self {
            id: slug(&title),
            series_title: title,
            poster_link: optional_text(&movie.poster_link),
            released_year: movie.released_year,
            certificate: optional_text(&movie.certificate),
            runtime: optional_text(&movie.runtime),
            genre: movie.genres.iter().filter_map(|g| text(g)).collect(),
            imdb_rating: finite(movie.imdb_rating),
            overview: text(&movie.overview),
            meta_score: finite(movie.meta_score),
            director: text(&movie.director),
            star1: optional_text(&movie.star1),
            star2: optional_text(&movie.star2),
            star3: optional_text(&movie.star3),
            star4: optional_text(&movie.star4),
            no_of_votes: movie.no_of_votes,
            gross: movie.gross,
        })
    }
}

/// Records for every movie that normalises; the rest are logged and skipped
pub fn records<'a, I>(movies: I) -> Vec<MovieRecord>
where
    I: IntoIterator<Item = &'a Movie>,
{
    movies
        .into_iter()
        .enumerate()
        .filter_map(|(i, movie)| match MovieRecord::try_from(movie) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping movie #{} in response: {}", i, e);
                None
            }
        })
        .collect()
}
