//! Text normalization shared by the resolver, filters, ranking and comparator.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase and strip diacritics (`"Resolución"` → `"resolucion"`).
///
/// Decomposes to NFD and drops combining marks, so `ñ` folds to `n`.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and accent-insensitive substring test.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold and replace every non-alphanumeric character with a space.
pub fn fold_alnum(s: &str) -> String {
    fold(s)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}
