//! Helpers for PATCH bodies.

use serde::{Deserialize, Deserializer};

/// Distinguish an absent key from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: absent
/// stays `None`, `null` becomes `Some(None)`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim tags, drop blanks and keep first occurrences in order.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.iter().any(|seen| seen == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}
