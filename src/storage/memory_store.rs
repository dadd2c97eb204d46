//! In-memory study store, used by tests and throwaway sessions.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use super::models::{Table, UserEntryRow};
use super::store::{ChangeFeed, Result, StoreError, StudyStore};
use crate::srs::{NewReviewEvent, ReviewEvent, SrsState};

#[derive(Default)]
struct Tables {
    /// Insertion order is kept; an upsert replaces the row where it sits
    user_entries: Vec<UserEntryRow>,
    srs_states: BTreeMap<(String, String), SrsState>,
    study_logs: Vec<ReviewEvent>,
    wallpapers: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

fn state_key(deck_id: &str, entry_id: &str) -> (String, String) {
    (deck_id.to_string(), entry_id.to_string())
}

fn push_event(tables: &mut Tables, event: &NewReviewEvent) -> ReviewEvent {
    let id = tables.study_logs.last().map_or(1, |last| last.id + 1);
    let stored = ReviewEvent::from_new(id, event.clone());
    tables.study_logs.push(stored.clone());
    stored
}

impl StudyStore for MemoryStore {
    fn upsert_user_entry(&self, row: &UserEntryRow) -> Result<()> {
        {
            let mut tables = self.write()?;
            match tables
                .user_entries
                .iter_mut()
                .find(|r| r.deck_id == row.deck_id && r.entry_id == row.entry_id)
            {
                Some(existing) => *existing = row.clone(),
                None => tables.user_entries.push(row.clone()),
            }
        }
        self.feed.notify(Table::UserEntries);
        Ok(())
    }

    fn get_user_entry(&self, deck_id: &str, entry_id: &str) -> Result<Option<UserEntryRow>> {
        Ok(self
            .read()?
            .user_entries
            .iter()
            .find(|r| r.deck_id == deck_id && r.entry_id == entry_id)
            .cloned())
    }

    fn list_user_entries(&self, deck_id: &str) -> Result<Vec<UserEntryRow>> {
        Ok(self
            .read()?
            .user_entries
            .iter()
            .filter(|r| r.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn list_all_user_entries(&self) -> Result<Vec<UserEntryRow>> {
        Ok(self.read()?.user_entries.clone())
    }

    fn upsert_srs_state(&self, state: &SrsState) -> Result<()> {
        self.write()?
            .srs_states
            .insert(state_key(&state.deck_id, &state.entry_id), state.clone());
        self.feed.notify(Table::SrsStates);
        Ok(())
    }

    fn get_srs_state(&self, deck_id: &str, entry_id: &str) -> Result<Option<SrsState>> {
        Ok(self.read()?.srs_states.get(&state_key(deck_id, entry_id)).cloned())
    }

    fn list_srs_states(&self, deck_id: &str) -> Result<Vec<SrsState>> {
        Ok(self
            .read()?
            .srs_states
            .values()
            .filter(|s| s.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn list_all_srs_states(&self) -> Result<Vec<SrsState>> {
        Ok(self.read()?.srs_states.values().cloned().collect())
    }

    fn append_review_event(&self, event: &NewReviewEvent) -> Result<ReviewEvent> {
        let stored = push_event(&mut *self.write()?, event);
        self.feed.notify(Table::ReviewEvents);
        Ok(stored)
    }

    fn list_review_events(&self, deck_id: &str) -> Result<Vec<ReviewEvent>> {
        Ok(self
            .read()?
            .study_logs
            .iter()
            .filter(|e| e.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn record_review(&self, state: &SrsState, event: &NewReviewEvent) -> Result<ReviewEvent> {
        let stored = {
            let mut tables = self.write()?;
            tables
                .srs_states
                .insert(state_key(&state.deck_id, &state.entry_id), state.clone());
            push_event(&mut tables, event)
        };
        self.feed.notify(Table::SrsStates);
        self.feed.notify(Table::ReviewEvents);
        Ok(stored)
    }

    fn set_wallpaper(&self, deck_id: &str, locator: Option<&str>) -> Result<()> {
        {
            let mut tables = self.write()?;
            match locator {
                Some(uri) => {
                    tables.wallpapers.insert(deck_id.to_string(), uri.to_string());
                }
                None => {
                    tables.wallpapers.remove(deck_id);
                }
            }
        }
        self.feed.notify(Table::Wallpapers);
        Ok(())
    }

    fn get_wallpaper(&self, deck_id: &str) -> Result<Option<String>> {
        Ok(self.read()?.wallpapers.get(deck_id).cloned())
    }

    fn list_wallpapers(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read()?.wallpapers.clone())
    }

    fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.feed.subscribe(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::ReviewOutcome;

    #[test]
    fn test_upsert_keeps_insertion_position() {
        let store = MemoryStore::new();
        store.upsert_user_entry(&UserEntryRow::new("mtg", "b", "b")).unwrap();
        store.upsert_user_entry(&UserEntryRow::new("mtg", "a", "a")).unwrap();
        store.upsert_user_entry(&UserEntryRow::new("mtg", "b", "bee")).unwrap();

        let rows = store.list_user_entries("mtg").unwrap();
        let terms: Vec<&str> = rows.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["bee", "a"]);
    }

    #[test]
    fn test_event_ids_increase() {
        let store = MemoryStore::new();
        let event = NewReviewEvent {
            deck_id: "mtg".to_string(),
            entry_id: "a".to_string(),
            outcome: ReviewOutcome::Unknown,
            reviewed_at_epoch_millis: 0,
        };
        let first = store.append_review_event(&event).unwrap();
        let second = store
            .record_review(&SrsState::new("mtg", "a", 0), &event)
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.wrong_counts("mtg").unwrap()["a"], 2);
    }
}
