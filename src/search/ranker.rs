//! Prefix/substring ranking of entries by term
//!
//! Cheap enough to run on every keystroke: no index, no allocation beyond the
//! normalized terms and the output vector.

use crate::vocab::Entry;

/// Match quality, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Exact = 0,
    Prefix = 1,
    Substring = 2,
}

/// Trim, lowercase and drop everything outside `[a-z0-9]`
pub fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// How a normalized term relates to a normalized, non-empty query
pub fn match_rank(normalized_term: &str, normalized_query: &str) -> Option<MatchRank> {
    if normalized_term == normalized_query {
        Some(MatchRank::Exact)
    } else if normalized_term.starts_with(normalized_query) {
        Some(MatchRank::Prefix)
    } else if normalized_term.contains(normalized_query) {
        Some(MatchRank::Substring)
    } else {
        None
    }
}

/// Filter and order candidates against a raw query.
///
/// A query that normalizes to nothing returns every candidate ordered by
/// lowercase term. Otherwise non-matching candidates are dropped and the rest
/// are ordered by match rank, then lowercase term.
pub fn rank(candidates: &[Entry], query: &str) -> Vec<Entry> {
    let normalized_query = normalize(query);
    if normalized_query.is_empty() {
        let mut all = candidates.to_vec();
        all.sort_by_cached_key(Entry::sort_key);
        return all;
    }

    let mut scored: Vec<(MatchRank, String, &Entry)> = candidates
        .iter()
        .filter_map(|entry| {
            match_rank(&normalize(entry.term()), &normalized_query)
                .map(|rank| (rank, entry.sort_key(), entry))
        })
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, entry)| entry.clone()).collect()
}
