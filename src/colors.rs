//! Category display colors, read from the categories table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps a category name to its display color, e.g. `"Food" -> "#ff6b6b"`.
///
/// Built by folding `(category, color)` rows in table order: a later row for the same category
/// replaces the color of an earlier one. A category that is not in the map has no color; callers
/// fall back to a default.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryColors(BTreeMap<String, String>);

impl CategoryColors {
    /// Builds the map from `(category, color)` pairs. Both are trimmed; pairs with an empty
    /// category are skipped.
    pub fn from_rows<I, C, K>(rows: I) -> Self
    where
        I: IntoIterator<Item = (C, K)>,
        C: AsRef<str>,
        K: AsRef<str>,
    {
        let mut colors = BTreeMap::new();
        for (category, color) in rows {
            let category = category.as_ref().trim();
            if category.is_empty() {
                continue;
            }
            colors.insert(category.to_string(), color.as_ref().trim().to_string());
        }
        Self(colors)
    }

    /// The color of `category`, if the table lists one.
    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
