//! Conversion of free user text into an FTS5 match expression.

use std::sync::LazyLock;

use regex::Regex;

/// Every searchable term becomes a quoted prefix match; terms are ANDed.
///
/// Returns `None` when the text holds no letters or digits, in which case the
/// caller treats the search as an unfiltered listing.
pub fn fts_expression(text: &str) -> Option<String> {
    static TERM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

    let terms: Vec<String> = TERM_RE
        .find_iter(text)
        .map(|m| format!("\"{}\"*", m.as_str()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}
