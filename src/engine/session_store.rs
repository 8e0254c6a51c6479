//! Session snapshot storage.
//!
//! Holds the feature list from the most recently accepted backend
//! response. Each response replaces the snapshot wholesale; the store
//! never merges, so every render pass sees exactly one response.

use std::collections::HashSet;

use crate::PointFeature;

/// The current session snapshot.
#[derive(Debug, Default)]
pub struct SessionStore {
    features: Vec<PointFeature>,
}

impl SessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    /// Replace the snapshot.
    ///
    /// Returns the number of features that have a usable point.
    pub fn replace(&mut self, features: Vec<PointFeature>) -> usize {
        self.features = features;
        self.positioned_count()
    }

    /// All features in response order, including ones without a point.
    pub fn features(&self) -> &[PointFeature] {
        &self.features
    }

    /// Get a feature by snapshot index.
    pub fn get(&self, index: usize) -> Option<&PointFeature> {
        self.features.get(index)
    }

    /// Number of features with a valid point geometry.
    pub fn positioned_count(&self) -> usize {
        self.features
            .iter()
            .filter(|f| f.position().is_some())
            .count()
    }

    /// Clear the snapshot.
    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Trim labels and drop blanks and case-insensitive duplicates, keeping
/// the first spelling seen.
pub fn dedupe_labels<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_lowercase()))
        .map(str::to_string)
        .collect()
}
