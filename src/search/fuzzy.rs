//! Fuzzy string similarity
//!
//! Token-sort and token-set ratios over normalized text, each in [0, 1].
//! The score used for structured matching is the larger of the two, so that
//! word order does not matter and a query whose words are all present in the
//! field ("engineer" vs "senior software engineer") scores as a full match.

use std::collections::BTreeSet;

use crate::model::normalize::tokens;

/// Default minimum similarity for a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: f32 = 0.8;

/// Edit-distance ratio between two already-normalized strings.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) as f32
}

/// Ratio after sorting the tokens of both sides.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f32 {
    let mut left = tokens(a);
    let mut right = tokens(b);
    left.sort();
    right.sort();
    ratio(&left.join(" "), &right.join(" "))
}

/// Ratio over the shared tokens and each side's remainder.
///
/// Scores 1.0 when one side's tokens are a subset of the other's.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let left: BTreeSet<String> = tokens(a).into_iter().collect();
    let right: BTreeSet<String> = tokens(b).into_iter().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = left.intersection(&right).map(String::as_str).collect();
    let only_left: Vec<&str> = left.difference(&right).map(String::as_str).collect();
    let only_right: Vec<&str> = right.difference(&left).map(String::as_str).collect();

    if !shared.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 1.0;
    }

    let sect = shared.join(" ");
    let join = |rest: &[&str]| {
        if sect.is_empty() {
            rest.join(" ")
        } else {
            format!("{sect} {}", rest.join(" "))
        }
    };
    let combined_left = join(&only_left);
    let combined_right = join(&only_right);

    ratio(&sect, &combined_left)
        .max(ratio(&sect, &combined_right))
        .max(ratio(&combined_left, &combined_right))
}

/// Similarity of `query` against a stored field value.
///
/// An empty query (after normalization) never matches anything.
#[must_use]
pub fn similarity(query: &str, value: &str) -> f32 {
    token_sort_ratio(query, value).max(token_set_ratio(query, value))
}
