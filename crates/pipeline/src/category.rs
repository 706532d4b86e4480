//! Categorical vocabularies for genre (multi-hot) and director (one-hot) encoding.

use crate::error::EncodeError;
use ndarray::{Array1, Array2};
use std::collections::{BTreeSet, HashMap};

/// A sorted set of labels with O(1) label -> column lookup.
///
/// Labels are sorted lexicographically so the column layout only depends on
/// the set of labels, never on catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryIndex {
    /// What the labels describe ("genre", "director"); used in error messages
    field: String,
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CategoryIndex {
    /// Fit a vocabulary on every label produced by `labels`
    pub fn fit<I, S>(field: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        let labels: Vec<String> = sorted.into_iter().collect();
        let positions = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();

        Self {
            field: field.to_string(),
            labels,
            positions,
        }
    }

    /// Number of columns in the encoded space
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in column order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    /// Multi-hot vector: 1.0 at the column of every known label.
    ///
    /// Unknown labels are ignored rather than rejected; a movie with no known
    /// labels encodes as the zero vector.
    pub fn multi_hot<S: AsRef<str>>(&self, labels: &[S]) -> Array1<f32> {
        let mut vector = Array1::zeros(self.len());
        for label in labels {
            if let Some(pos) = self.position(label.as_ref()) {
                vector[pos] = 1.0;
            }
        }
        vector
    }

    /// One-hot vector for a single label
    pub fn one_hot(&self, label: &str) -> Result<Array1<f32>, EncodeError> {
        let pos = self
            .position(label)
            .ok_or_else(|| EncodeError::UnknownCategory {
                field: self.field.clone(),
                value: label.to_string(),
            })?;
        let mut vector = Array1::zeros(self.len());
        vector[pos] = 1.0;
        Ok(vector)
    }

    /// Multi-hot matrix, one row per entry of `rows`
    pub fn multi_hot_matrix<S: AsRef<str>>(&self, rows: &[&[S]]) -> Array2<f32> {
        let mut matrix = Array2::zeros((rows.len(), self.len()));
        for (r, labels) in rows.iter().enumerate() {
            for label in labels.iter() {
                if let Some(pos) = self.position(label.as_ref()) {
                    matrix[[r, pos]] = 1.0;
                }
            }
        }
        matrix
    }

    /// One-hot matrix, one row per label
    pub fn one_hot_matrix<S: AsRef<str>>(&self, rows: &[S]) -> Result<Array2<f32>, EncodeError> {
        let mut matrix = Array2::zeros((rows.len(), self.len()));
        for (r, label) in rows.iter().enumerate() {
            let pos = self
                .position(label.as_ref())
                .ok_or_else(|| EncodeError::UnknownCategory {
                    field: self.field.clone(),
                    value: label.as_ref().to_string(),
                })?;
            matrix[[r, pos]] = 1.0;
        }
        Ok(matrix)
    }
}
