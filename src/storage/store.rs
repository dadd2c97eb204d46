use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::watch;

use super::models::{Table, UserEntryRow};
use crate::srs::{NewReviewEvent, ReviewEvent, ReviewOutcome, SrsState};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persisted user overlay, review state, study log and wallpaper tables.
///
/// Every write is atomic per key and visible to reads that follow it. Each
/// logical table has a change feed; its counter is bumped after every write
/// to that table.
pub trait StudyStore: Send + Sync {
    // ===== User entries =====

    fn upsert_user_entry(&self, row: &UserEntryRow) -> Result<()>;

    fn get_user_entry(&self, deck_id: &str, entry_id: &str) -> Result<Option<UserEntryRow>>;

    /// Rows of one deck in insertion order
    fn list_user_entries(&self, deck_id: &str) -> Result<Vec<UserEntryRow>>;

    fn list_all_user_entries(&self) -> Result<Vec<UserEntryRow>>;

    // ===== Review state =====

    fn upsert_srs_state(&self, state: &SrsState) -> Result<()>;

    fn get_srs_state(&self, deck_id: &str, entry_id: &str) -> Result<Option<SrsState>>;

    fn list_srs_states(&self, deck_id: &str) -> Result<Vec<SrsState>>;

    fn list_all_srs_states(&self) -> Result<Vec<SrsState>>;

    // ===== Study log =====

    fn append_review_event(&self, event: &NewReviewEvent) -> Result<ReviewEvent>;

    fn list_review_events(&self, deck_id: &str) -> Result<Vec<ReviewEvent>>;

    /// Persist a review's resulting state together with its log record
    fn record_review(&self, state: &SrsState, event: &NewReviewEvent) -> Result<ReviewEvent> {
        self.upsert_srs_state(state)?;
        self.append_review_event(event)
    }

    /// Number of UNKNOWN quiz answers per entry id
    fn wrong_counts(&self, deck_id: &str) -> Result<BTreeMap<String, u32>> {
        let mut counts = BTreeMap::new();
        for event in self.list_review_events(deck_id)? {
            if event.outcome == ReviewOutcome::Unknown {
                *counts.entry(event.entry_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    // ===== Deck wallpapers =====

    /// Store a locator, or remove the preference with `None`
    fn set_wallpaper(&self, deck_id: &str, locator: Option<&str>) -> Result<()>;

    fn get_wallpaper(&self, deck_id: &str) -> Result<Option<String>>;

    fn list_wallpapers(&self) -> Result<BTreeMap<String, String>>;

    // ===== Change notification =====

    fn subscribe(&self, table: Table) -> watch::Receiver<u64>;
}

/// Per-table change counters shared by store implementations
pub struct ChangeFeed {
    senders: [watch::Sender<u64>; 4],
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            senders: std::array::from_fn(|_| watch::channel(0).0),
        }
    }

    fn sender(&self, table: Table) -> &watch::Sender<u64> {
        let idx = match table {
            Table::UserEntries => 0,
            Table::SrsStates => 1,
            Table::ReviewEvents => 2,
            Table::Wallpapers => 3,
        };
        &self.senders[idx]
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.sender(table).subscribe()
    }

    pub fn notify(&self, table: Table) {
        self.sender(table).send_modify(|version| *version += 1);
        log::trace!("store: {:?} changed", table);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_bumps_only_that_table() {
        let feed = ChangeFeed::new();
        let mut entries = feed.subscribe(Table::UserEntries);
        let states = feed.subscribe(Table::SrsStates);

        feed.notify(Table::UserEntries);

        assert!(entries.has_changed().unwrap());
        assert_eq!(*entries.borrow_and_update(), 1);
        assert!(!states.has_changed().unwrap());
    }
}
