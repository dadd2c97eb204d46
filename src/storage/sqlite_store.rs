//! SQLite-backed study store.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

use super::legacy::{decode_json_list, decode_list, encode_json_list, encode_list};
use super::models::{Table, UserEntryRow};
use super::store::{ChangeFeed, Result, StoreError, StudyStore};
use crate::srs::{NewReviewEvent, ReviewEvent, ReviewOutcome, SrsPhase, SrsState};

const SCHEMA: &str = r#"
    -- User-authored entries; list columns keep their flattened legacy encoding
    CREATE TABLE IF NOT EXISTS user_entries (
        deck_id TEXT NOT NULL,
        entry_id TEXT NOT NULL,
        term TEXT NOT NULL,
        display_term TEXT NOT NULL DEFAULT '',
        pos TEXT NOT NULL DEFAULT '',
        meaning_en TEXT NOT NULL DEFAULT '',
        meaning_ja TEXT NOT NULL DEFAULT '',
        lore_note TEXT NOT NULL DEFAULT '',
        canonical_translation TEXT NOT NULL DEFAULT '',
        tags_csv TEXT NOT NULL DEFAULT '',
        synonyms_csv TEXT NOT NULL DEFAULT '',
        confusables_csv TEXT NOT NULL DEFAULT '',
        examples_json TEXT NOT NULL DEFAULT '',
        source_quotes_json TEXT NOT NULL DEFAULT '',
        updated_at TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (deck_id, entry_id)
    );

    CREATE TABLE IF NOT EXISTS srs_states (
        deck_id TEXT NOT NULL,
        entry_id TEXT NOT NULL,
        phase TEXT NOT NULL,
        ease REAL NOT NULL,
        interval_days INTEGER NOT NULL,
        due_epoch_day INTEGER NOT NULL,
        last_reviewed_at_epoch_millis INTEGER,
        lapse_count INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (deck_id, entry_id)
    );

    -- Append-only study log
    CREATE TABLE IF NOT EXISTS study_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id TEXT NOT NULL,
        entry_id TEXT NOT NULL,
        rating TEXT NOT NULL,
        reviewed_at_epoch_millis INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS deck_wallpapers (
        deck_id TEXT PRIMARY KEY,
        uri TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_user_entries_deck ON user_entries(deck_id);
    CREATE INDEX IF NOT EXISTS idx_srs_states_due ON srs_states(deck_id, due_epoch_day);
    CREATE INDEX IF NOT EXISTS idx_study_logs_deck ON study_logs(deck_id, entry_id);
"#;

const USER_ENTRY_COLUMNS: &str = "deck_id, entry_id, term, display_term, pos, meaning_en, \
     meaning_ja, lore_note, canonical_translation, tags_csv, synonyms_csv, confusables_csv, \
     examples_json, source_quotes_json, updated_at";

const SRS_STATE_COLUMNS: &str = "deck_id, entry_id, phase, ease, interval_days, due_epoch_day, \
     last_reviewed_at_epoch_millis, lapse_count";

/// Study store persisted in a single SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        log::info!("store: opened {}", db_path.display());
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_user_entries(&self, filter: Option<&str>) -> Result<Vec<UserEntryRow>> {
        let conn = self.conn()?;
        let rows = match filter {
            Some(deck_id) => {
                let sql = format!(
                    "SELECT {} FROM user_entries WHERE deck_id = ?1 ORDER BY rowid",
                    USER_ENTRY_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![deck_id], user_entry_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("SELECT {} FROM user_entries ORDER BY rowid", USER_ENTRY_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], user_entry_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    fn query_srs_states(&self, filter: Option<&str>) -> Result<Vec<SrsState>> {
        let conn = self.conn()?;
        let states = match filter {
            Some(deck_id) => {
                let sql = format!("SELECT {} FROM srs_states WHERE deck_id = ?1", SRS_STATE_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![deck_id], srs_state_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("SELECT {} FROM srs_states", SRS_STATE_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], srs_state_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(states)
    }
}

fn user_entry_from_row(row: &Row<'_>) -> rusqlite::Result<UserEntryRow> {
    Ok(UserEntryRow {
        deck_id: row.get(0)?,
        entry_id: row.get(1)?,
        term: row.get(2)?,
        display_term: row.get(3)?,
        pos: row.get(4)?,
        meaning_en: row.get(5)?,
        meaning_ja: row.get(6)?,
        lore_note: row.get(7)?,
        canonical_translation: row.get(8)?,
        tags: decode_list(&row.get::<_, String>(9)?),
        synonyms: decode_list(&row.get::<_, String>(10)?),
        confusables: decode_list(&row.get::<_, String>(11)?),
        examples: decode_json_list(&row.get::<_, String>(12)?),
        source_quotes: decode_json_list(&row.get::<_, String>(13)?),
        updated_at: row.get(14)?,
    })
}

fn srs_state_from_row(row: &Row<'_>) -> rusqlite::Result<SrsState> {
    Ok(SrsState {
        deck_id: row.get(0)?,
        entry_id: row.get(1)?,
        phase: SrsPhase::from_label(&row.get::<_, String>(2)?),
        ease: row.get(3)?,
        interval_days: row.get(4)?,
        due_epoch_day: row.get(5)?,
        last_reviewed_at_epoch_millis: row.get(6)?,
        lapse_count: row.get(7)?,
    })
}

fn upsert_srs_state_on(conn: &Connection, state: &SrsState) -> Result<()> {
    conn.execute(
        "INSERT INTO srs_states (deck_id, entry_id, phase, ease, interval_days, due_epoch_day,
             last_reviewed_at_epoch_millis, lapse_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(deck_id, entry_id) DO UPDATE SET
             phase = excluded.phase,
             ease = excluded.ease,
             interval_days = excluded.interval_days,
             due_epoch_day = excluded.due_epoch_day,
             last_reviewed_at_epoch_millis = excluded.last_reviewed_at_epoch_millis,
             lapse_count = excluded.lapse_count",
        params![
            state.deck_id,
            state.entry_id,
            state.phase.as_str(),
            state.ease,
            state.interval_days,
            state.due_epoch_day,
            state.last_reviewed_at_epoch_millis,
            state.lapse_count,
        ],
    )?;
    Ok(())
}

fn append_review_event_on(conn: &Connection, event: &NewReviewEvent) -> Result<ReviewEvent> {
    conn.execute(
        "INSERT INTO study_logs (deck_id, entry_id, rating, reviewed_at_epoch_millis)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            event.deck_id,
            event.entry_id,
            event.outcome.as_str(),
            event.reviewed_at_epoch_millis,
        ],
    )?;
    Ok(ReviewEvent::from_new(conn.last_insert_rowid(), event.clone()))
}

impl StudyStore for SqliteStore {
    fn upsert_user_entry(&self, row: &UserEntryRow) -> Result<()> {
        let tags = encode_list(&row.tags)?;
        let synonyms = encode_list(&row.synonyms)?;
        let confusables = encode_list(&row.confusables)?;
        let examples = encode_json_list(&row.examples)?;
        let source_quotes = encode_json_list(&row.source_quotes)?;

        {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO user_entries (deck_id, entry_id, term, display_term, pos, meaning_en,
                     meaning_ja, lore_note, canonical_translation, tags_csv, synonyms_csv,
                     confusables_csv, examples_json, source_quotes_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(deck_id, entry_id) DO UPDATE SET
                     term = excluded.term,
                     display_term = excluded.display_term,
                     pos = excluded.pos,
                     meaning_en = excluded.meaning_en,
                     meaning_ja = excluded.meaning_ja,
                     lore_note = excluded.lore_note,
                     canonical_translation = excluded.canonical_translation,
                     tags_csv = excluded.tags_csv,
                     synonyms_csv = excluded.synonyms_csv,
                     confusables_csv = excluded.confusables_csv,
                     examples_json = excluded.examples_json,
                     source_quotes_json = excluded.source_quotes_json,
                     updated_at = excluded.updated_at",
                params![
                    row.deck_id,
                    row.entry_id,
                    row.term,
                    row.display_term,
                    row.pos,
                    row.meaning_en,
                    row.meaning_ja,
                    row.lore_note,
                    row.canonical_translation,
                    tags,
                    synonyms,
                    confusables,
                    examples,
                    source_quotes,
                    row.updated_at,
                ],
            )?;
        }

        self.feed.notify(Table::UserEntries);
        Ok(())
    }

    fn get_user_entry(&self, deck_id: &str, entry_id: &str) -> Result<Option<UserEntryRow>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM user_entries WHERE deck_id = ?1 AND entry_id = ?2",
            USER_ENTRY_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![deck_id, entry_id], user_entry_from_row)
            .optional()?)
    }

    fn list_user_entries(&self, deck_id: &str) -> Result<Vec<UserEntryRow>> {
        self.query_user_entries(Some(deck_id))
    }

    fn list_all_user_entries(&self) -> Result<Vec<UserEntryRow>> {
        self.query_user_entries(None)
    }

    fn upsert_srs_state(&self, state: &SrsState) -> Result<()> {
        upsert_srs_state_on(&*self.conn()?, state)?;
        self.feed.notify(Table::SrsStates);
        Ok(())
    }

    fn get_srs_state(&self, deck_id: &str, entry_id: &str) -> Result<Option<SrsState>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM srs_states WHERE deck_id = ?1 AND entry_id = ?2",
            SRS_STATE_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![deck_id, entry_id], srs_state_from_row)
            .optional()?)
    }

    fn list_srs_states(&self, deck_id: &str) -> Result<Vec<SrsState>> {
        self.query_srs_states(Some(deck_id))
    }

    fn list_all_srs_states(&self) -> Result<Vec<SrsState>> {
        self.query_srs_states(None)
    }

    fn append_review_event(&self, event: &NewReviewEvent) -> Result<ReviewEvent> {
        let stored = append_review_event_on(&*self.conn()?, event)?;
        self.feed.notify(Table::ReviewEvents);
        Ok(stored)
    }

    fn list_review_events(&self, deck_id: &str) -> Result<Vec<ReviewEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, deck_id, entry_id, rating, reviewed_at_epoch_millis
             FROM study_logs WHERE deck_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![deck_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, deck_id, entry_id, label, reviewed_at_epoch_millis) = row?;
            match ReviewOutcome::from_label(&label) {
                Some(outcome) => events.push(ReviewEvent {
                    id,
                    deck_id,
                    entry_id,
                    outcome,
                    reviewed_at_epoch_millis,
                }),
                None => log::warn!("store: skipping study log {} with unknown rating '{}'", id, label),
            }
        }
        Ok(events)
    }

    fn record_review(&self, state: &SrsState, event: &NewReviewEvent) -> Result<ReviewEvent> {
        let stored = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            upsert_srs_state_on(&tx, state)?;
            let stored = append_review_event_on(&tx, event)?;
            tx.commit()?;
            stored
        };

        self.feed.notify(Table::SrsStates);
        self.feed.notify(Table::ReviewEvents);
        Ok(stored)
    }

    fn wrong_counts(&self, deck_id: &str) -> Result<BTreeMap<String, u32>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT entry_id, COUNT(*) FROM study_logs
             WHERE deck_id = ?1 AND rating = ?2
             GROUP BY entry_id",
        )?;
        let rows = stmt.query_map(params![deck_id, ReviewOutcome::Unknown.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
    }

    fn set_wallpaper(&self, deck_id: &str, locator: Option<&str>) -> Result<()> {
        {
            let conn = self.conn()?;
            match locator {
                Some(uri) => conn.execute(
                    "INSERT INTO deck_wallpapers (deck_id, uri) VALUES (?1, ?2)
                     ON CONFLICT(deck_id) DO UPDATE SET uri = excluded.uri",
                    params![deck_id, uri],
                )?,
                None => conn.execute(
                    "DELETE FROM deck_wallpapers WHERE deck_id = ?1",
                    params![deck_id],
                )?,
            };
        }

        self.feed.notify(Table::Wallpapers);
        Ok(())
    }

    fn get_wallpaper(&self, deck_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT uri FROM deck_wallpapers WHERE deck_id = ?1",
                params![deck_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn list_wallpapers(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT deck_id, uri FROM deck_wallpapers")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<BTreeMap<String, String>>>()?)
    }

    fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.feed.subscribe(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Example;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(temp.path().join("data").join("study.db")).unwrap();
        (store, temp)
    }

    fn review(entry_id: &str, outcome: ReviewOutcome, at: i64) -> NewReviewEvent {
        NewReviewEvent {
            deck_id: "mtg".to_string(),
            entry_id: entry_id.to_string(),
            outcome,
            reviewed_at_epoch_millis: at,
        }
    }

    #[test]
    fn test_user_entry_upsert_replaces_in_place() {
        let (store, _temp) = create_test_store();

        let mut first = UserEntryRow::new("mtg", "walk", "walk");
        first.tags = vec!["lore".to_string(), "verb".to_string()];
        first.examples = vec![Example {
            text_en: "Walk on.".to_string(),
            text_ja: None,
        }];
        store.upsert_user_entry(&first).unwrap();
        store.upsert_user_entry(&UserEntryRow::new("mtg", "zeal", "zeal")).unwrap();

        let mut edited = first.clone();
        edited.meaning_en = "to move on foot".to_string();
        store.upsert_user_entry(&edited).unwrap();

        let rows = store.list_user_entries("mtg").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], edited);
        assert_eq!(rows[1].entry_id, "zeal");
        assert!(store.list_user_entries("other").unwrap().is_empty());
        assert_eq!(store.get_user_entry("mtg", "walk").unwrap(), Some(edited));
        assert_eq!(store.get_user_entry("mtg", "missing").unwrap(), None);
    }

    #[test]
    fn test_malformed_legacy_columns_read_as_empty() {
        let (store, _temp) = create_test_store();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO user_entries (deck_id, entry_id, term, tags_csv, examples_json, source_quotes_json)
                 VALUES ('mtg', 'old', 'old', ' lore ,, story ', '{not json', '[{\"source\": 1}]')",
                [],
            )
            .unwrap();
        }

        let row = store.get_user_entry("mtg", "old").unwrap().unwrap();
        assert_eq!(row.tags, vec!["lore", "story"]);
        assert!(row.examples.is_empty());
        assert!(row.source_quotes.is_empty());
        assert_eq!(row.to_entry().display_term(), "old");
    }

    #[test]
    fn test_legacy_list_columns_split_on_commas_only() {
        let (store, _temp) = create_test_store();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO user_entries (deck_id, entry_id, term, tags_csv, synonyms_csv)
                 VALUES ('mtg', 'legacy', 'legacy', ?1, ?2)",
                params!["\"quoted\", plain", "line1\nline2, z"],
            )
            .unwrap();
        }

        let row = store.get_user_entry("mtg", "legacy").unwrap().unwrap();
        assert_eq!(row.tags, vec!["\"quoted\"", "plain"]);
        assert_eq!(row.synonyms, vec!["line1\nline2", "z"]);
    }

    #[test]
    fn test_list_item_with_comma_is_rejected() {
        let (store, _temp) = create_test_store();
        let mut row = UserEntryRow::new("mtg", "walk", "walk");
        row.synonyms = vec!["to walk, slowly".to_string()];

        let err = store.upsert_user_entry(&row).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow(_)));
        assert_eq!(store.get_user_entry("mtg", "walk").unwrap(), None);
    }

    #[test]
    fn test_record_review_persists_state_and_log() {
        let (store, _temp) = create_test_store();
        let mut state = SrsState::new("mtg", "walk", 100);
        state.phase = SrsPhase::Review;
        state.interval_days = 3;
        state.due_epoch_day = 103;
        state.last_reviewed_at_epoch_millis = Some(42);

        let stored = store
            .record_review(&state, &review("walk", ReviewOutcome::Good, 42))
            .unwrap();
        assert_eq!(stored.outcome, ReviewOutcome::Good);

        assert_eq!(store.get_srs_state("mtg", "walk").unwrap(), Some(state));
        assert_eq!(store.list_srs_states("mtg").unwrap().len(), 1);
        assert_eq!(store.list_all_srs_states().unwrap().len(), 1);
        assert_eq!(store.list_review_events("mtg").unwrap(), vec![stored]);
    }

    #[test]
    fn test_wrong_counts_only_count_unknown() {
        let (store, _temp) = create_test_store();
        store.append_review_event(&review("walk", ReviewOutcome::Unknown, 1)).unwrap();
        store.append_review_event(&review("walk", ReviewOutcome::Unknown, 2)).unwrap();
        store.append_review_event(&review("walk", ReviewOutcome::Again, 3)).unwrap();
        store.append_review_event(&review("zeal", ReviewOutcome::Known, 4)).unwrap();

        let counts = store.wrong_counts("mtg").unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["walk"], 2);
    }

    #[test]
    fn test_unknown_rating_label_is_skipped() {
        let (store, _temp) = create_test_store();
        store.append_review_event(&review("walk", ReviewOutcome::Easy, 1)).unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO study_logs (deck_id, entry_id, rating, reviewed_at_epoch_millis)
                 VALUES ('mtg', 'walk', 'HARD', 2)",
                [],
            )
            .unwrap();
        }
        assert_eq!(store.list_review_events("mtg").unwrap().len(), 1);
    }

    #[test]
    fn test_wallpaper_set_and_clear() {
        let (store, _temp) = create_test_store();
        let mut feed = store.subscribe(Table::Wallpapers);

        store.set_wallpaper("mtg", Some("file:///a.png")).unwrap();
        store.set_wallpaper("mtg", Some("file:///b.png")).unwrap();
        assert_eq!(store.get_wallpaper("mtg").unwrap().as_deref(), Some("file:///b.png"));
        assert_eq!(store.list_wallpapers().unwrap().len(), 1);

        store.set_wallpaper("mtg", None).unwrap();
        assert_eq!(store.get_wallpaper("mtg").unwrap(), None);
        assert!(feed.has_changed().unwrap());
        assert_eq!(*feed.borrow_and_update(), 3);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("study.db");
        {
            let store = SqliteStore::open(path.clone()).unwrap();
            store.upsert_user_entry(&UserEntryRow::new("mtg", "walk", "walk")).unwrap();
        }
        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.list_all_user_entries().unwrap().len(), 1);
    }
}
