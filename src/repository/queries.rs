//! Snapshot queries shared by one-shot calls and view recomputes

use std::collections::{BTreeMap, HashMap};

use super::Result;
use crate::catalog::LoadedCatalog;
use crate::srs::SrsState;
use crate::storage::StudyStore;
use crate::vocab::{deck_entry_counts, merge_entries, Entry};

pub(crate) fn merged_entries(
    catalog: &LoadedCatalog,
    store: &dyn StudyStore,
    deck_id: &str,
) -> Result<Vec<Entry>> {
    let bundled = catalog
        .entries_by_deck
        .get(deck_id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let user_rows = store.list_user_entries(deck_id)?;
    Ok(merge_entries(bundled, &user_rows))
}

pub(crate) fn entry_counts(catalog: &LoadedCatalog, store: &dyn StudyStore) -> Result<BTreeMap<String, usize>> {
    let user_rows = store.list_all_user_entries()?;
    Ok(deck_entry_counts(&catalog.decks, &catalog.entries_by_deck, &user_rows))
}

/// Entries due on `today_epoch_day`, most overdue first.
///
/// An entry without a state counts as due since forever and sorts ahead of
/// every scheduled entry. Ties are broken by lowercase term.
pub fn due_entries(entries: &[Entry], states: &[SrsState], today_epoch_day: i64) -> Vec<Entry> {
    let due_by_entry: HashMap<&str, i64> = states
        .iter()
        .map(|s| (s.entry_id.as_str(), s.due_epoch_day))
        .collect();

    let mut due: Vec<(i64, String, &Entry)> = entries
        .iter()
        .map(|entry| {
            let day = due_by_entry.get(entry.entry_id()).copied().unwrap_or(i64::MIN);
            (day, entry.sort_key(), entry)
        })
        .filter(|(day, _, _)| *day <= today_epoch_day)
        .collect();
    due.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    due.into_iter().map(|(_, _, entry)| entry.clone()).collect()
}

pub(crate) fn due_for_deck(
    catalog: &LoadedCatalog,
    store: &dyn StudyStore,
    deck_id: &str,
    today_epoch_day: i64,
) -> Result<Vec<Entry>> {
    let entries = merged_entries(catalog, store, deck_id)?;
    let states = store.list_srs_states(deck_id)?;
    Ok(due_entries(&entries, &states, today_epoch_day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UserEntryRow};
    use crate::vocab::EntryBody;

    fn bundled(id: &str, term: &str) -> Entry {
        Entry::Bundled(EntryBody::new("mtg", id, term).with_display_default())
    }

    fn state(id: &str, due: i64) -> SrsState {
        let mut state = SrsState::new("mtg", id, 0);
        state.due_epoch_day = due;
        state
    }

    #[test]
    fn test_unreviewed_entries_come_first() {
        let entries = vec![bundled("a", "Zeal"), bundled("b", "anchor"), bundled("c", "mana"), bundled("d", "later")];
        let states = vec![state("b", 100), state("c", 90), state("d", 101)];

        let due = due_entries(&entries, &states, 100);
        let ids: Vec<&str> = due.iter().map(Entry::entry_id).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_ties_sort_by_term() {
        let entries = vec![bundled("a", "beta"), bundled("b", "Alpha")];
        let due = due_entries(&entries, &[], 0);
        assert_eq!(due[0].entry_id(), "b");
    }

    #[test]
    fn test_merged_entries_for_unknown_deck_uses_overlay_only() {
        let store = MemoryStore::new();
        store.upsert_user_entry(&UserEntryRow::new("mine", "x", "xylem")).unwrap();

        let catalog = LoadedCatalog::default();
        let merged = merged_entries(&catalog, &store, "mine").unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(entry_counts(&catalog, &store).unwrap()["mine"], 1);
    }
}
