//! Overlay merge: bundled catalog entries combined with user edits
//!
//! User rows override bundled entries by entry id and keep the bundled entry's
//! position; new user entries are appended. The result is then sorted by
//! lowercase term with a stable sort, so equal terms stay in insertion order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::{Deck, Entry};
use crate::storage::UserEntryRow;

/// Merge one deck's bundled entries with that deck's overlay rows.
pub fn merge_entries(bundled: &[Entry], user_rows: &[UserEntryRow]) -> Vec<Entry> {
    let mut merged = merge_unsorted(bundled, user_rows);
    merged.sort_by_cached_key(Entry::sort_key);
    merged
}

fn merge_unsorted(bundled: &[Entry], user_rows: &[UserEntryRow]) -> Vec<Entry> {
    let mut merged: Vec<Entry> = Vec::with_capacity(bundled.len() + user_rows.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(merged.capacity());

    let overlay = user_rows.iter().map(UserEntryRow::to_entry);
    for entry in bundled.iter().cloned().chain(overlay) {
        match positions.get(entry.entry_id()) {
            Some(&idx) => merged[idx] = entry,
            None => {
                positions.insert(entry.entry_id().to_string(), merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}

/// Count merged entries for every known deck id.
///
/// The deck universe is the union of catalog decks, catalog entry groups and
/// overlay groups, so a deck that only exists through user rows still gets a count.
pub fn deck_entry_counts(
    decks: &[Deck],
    bundled_by_deck: &HashMap<String, Vec<Entry>>,
    user_rows: &[UserEntryRow],
) -> BTreeMap<String, usize> {
    let mut user_by_deck: HashMap<&str, Vec<UserEntryRow>> = HashMap::new();
    for row in user_rows {
        user_by_deck
            .entry(row.deck_id.as_str())
            .or_default()
            .push(row.clone());
    }

    let mut deck_ids: BTreeSet<&str> = BTreeSet::new();
    deck_ids.extend(decks.iter().map(|d| d.deck_id.as_str()));
    deck_ids.extend(bundled_by_deck.keys().map(String::as_str));
    deck_ids.extend(user_by_deck.keys().copied());

    deck_ids
        .into_iter()
        .map(|deck_id| {
            let bundled = bundled_by_deck
                .get(deck_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let rows = user_by_deck
                .get(deck_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (deck_id.to_string(), merge_unsorted(bundled, rows).len())
        })
        .collect()
}
