use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{watch, Mutex, OnceCell};

use super::clock::Clock;
use super::grants::ResourceGrants;
use super::queries::{due_for_deck, entry_counts, merged_entries};
use super::signal::{derive, trigger};
use super::{RepositoryError, Result};
use crate::catalog::{CatalogSource, LoadedCatalog};
use crate::search;
use crate::srs::{self, NewReviewEvent, ReviewOutcome, ReviewRating, ReviewStats, SrsState};
use crate::storage::{StudyStore, Table, UserEntryRow};
use crate::vocab::{select_quiz_entries, Deck, Entry, QuizCategory};

/// What to show behind a deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Wallpaper {
    /// User-picked resource that is still accessible
    Custom(String),
    /// The deck's bundled image name
    DeckImage(String),
    Default,
}

/// Single entry point for decks, merged entries, reviews and preferences.
///
/// Built once with its collaborators and passed around explicitly. Call
/// [`Repository::initialize`] before relying on catalog-backed results; views
/// created earlier pick the catalog up once it loads.
pub struct Repository {
    catalog_source: Arc<dyn CatalogSource>,
    store: Arc<dyn StudyStore>,
    clock: Arc<dyn Clock>,
    grants: Arc<dyn ResourceGrants>,
    /// Load outcome; `Some(message)` when loading failed
    init: OnceCell<Option<String>>,
    catalog: watch::Sender<Arc<LoadedCatalog>>,
    review_lock: Mutex<()>,
}

impl Repository {
    pub fn new(
        catalog_source: Arc<dyn CatalogSource>,
        store: Arc<dyn StudyStore>,
        clock: Arc<dyn Clock>,
        grants: Arc<dyn ResourceGrants>,
    ) -> Self {
        let (catalog, _) = watch::channel(Arc::new(LoadedCatalog::default()));
        Self {
            catalog_source,
            store,
            clock,
            grants,
            init: OnceCell::new(),
            catalog,
            review_lock: Mutex::new(()),
        }
    }

    // ===== Initialization =====

    /// Load the bundled catalog, once.
    ///
    /// Concurrent and repeated calls share the single load and its outcome.
    /// On failure the catalog stays empty and every call reports the error.
    pub async fn initialize(&self) -> Result<()> {
        let outcome = self
            .init
            .get_or_init(|| async {
                let source = Arc::clone(&self.catalog_source);
                match tokio::task::spawn_blocking(move || source.load()).await {
                    Ok(Ok(loaded)) => {
                        log::info!(
                            "repository: catalog ready with {} decks",
                            loaded.decks.len()
                        );
                        self.catalog.send_replace(Arc::new(loaded));
                        None
                    }
                    Ok(Err(e)) => {
                        log::error!("repository: catalog load failed: {}", e);
                        Some(e.to_string())
                    }
                    Err(e) => {
                        log::error!("repository: catalog loader task failed: {}", e);
                        Some(e.to_string())
                    }
                }
            })
            .await;

        match outcome {
            None => Ok(()),
            Some(message) => Err(RepositoryError::CatalogLoad(message.clone())),
        }
    }

    /// The catalog load error, if loading has run and failed
    pub fn load_error(&self) -> Option<String> {
        self.init.get().cloned().flatten()
    }

    fn catalog_snapshot(&self) -> Arc<LoadedCatalog> {
        self.catalog.borrow().clone()
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn StudyStore>) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| RepositoryError::Task(e.to_string()))?
    }

    /// Run a store write, logging its failure before handing it back
    async fn write<T, F>(&self, what: &str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn StudyStore>) -> Result<T> + Send + 'static,
    {
        let result = self.blocking(f).await;
        if let Err(e) = &result {
            log::warn!("repository: {} failed: {}", what, e);
        }
        result
    }

    // ===== Views =====

    pub async fn observe_decks(&self) -> Result<watch::Receiver<Vec<Deck>>> {
        let catalog = self.catalog.subscribe();
        derive(
            "decks".to_string(),
            vec![trigger(self.catalog.subscribe())],
            move || Ok(catalog.borrow().decks.clone()),
        )
        .await
    }

    pub async fn observe_deck_wallpapers(&self) -> Result<watch::Receiver<BTreeMap<String, String>>> {
        let store = Arc::clone(&self.store);
        derive(
            "deck wallpapers".to_string(),
            vec![trigger(self.store.subscribe(Table::Wallpapers))],
            move || Ok(store.list_wallpapers()?),
        )
        .await
    }

    pub async fn observe_deck_entry_counts(&self) -> Result<watch::Receiver<BTreeMap<String, usize>>> {
        let catalog = self.catalog.subscribe();
        let store = Arc::clone(&self.store);
        derive(
            "deck entry counts".to_string(),
            vec![
                trigger(self.catalog.subscribe()),
                trigger(self.store.subscribe(Table::UserEntries)),
            ],
            move || {
                let snapshot: Arc<LoadedCatalog> = catalog.borrow().clone();
                entry_counts(&snapshot, store.as_ref())
            },
        )
        .await
    }

    /// Merged entries of a deck, sorted by lowercase term
    pub async fn observe_entries(&self, deck_id: &str) -> Result<watch::Receiver<Vec<Entry>>> {
        let catalog = self.catalog.subscribe();
        let store = Arc::clone(&self.store);
        let deck_id = deck_id.to_string();
        derive(
            format!("entries of {}", deck_id),
            vec![
                trigger(self.catalog.subscribe()),
                trigger(self.store.subscribe(Table::UserEntries)),
            ],
            move || {
                let snapshot: Arc<LoadedCatalog> = catalog.borrow().clone();
                merged_entries(&snapshot, store.as_ref(), &deck_id)
            },
        )
        .await
    }

    /// One merged entry, or `None` while it does not exist
    pub async fn observe_entry(&self, deck_id: &str, entry_id: &str) -> Result<watch::Receiver<Option<Entry>>> {
        let entries = self.observe_entries(deck_id).await?;
        let reader = entries.clone();
        let entry_id = entry_id.to_string();
        derive(
            format!("entry {}/{}", deck_id, entry_id),
            vec![trigger(entries)],
            move || {
                Ok(reader
                    .borrow()
                    .iter()
                    .find(|e| e.entry_id() == entry_id)
                    .cloned())
            },
        )
        .await
    }

    /// Unknown quiz answers per entry id
    pub async fn observe_wrong_counts(&self, deck_id: &str) -> Result<watch::Receiver<BTreeMap<String, u32>>> {
        let store = Arc::clone(&self.store);
        let deck_id = deck_id.to_string();
        derive(
            format!("wrong counts of {}", deck_id),
            vec![trigger(self.store.subscribe(Table::ReviewEvents))],
            move || Ok(store.wrong_counts(&deck_id)?),
        )
        .await
    }

    pub async fn observe_due_entries(&self, deck_id: &str) -> Result<watch::Receiver<Vec<Entry>>> {
        let catalog = self.catalog.subscribe();
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let deck_id = deck_id.to_string();
        derive(
            format!("due entries of {}", deck_id),
            vec![
                trigger(self.catalog.subscribe()),
                trigger(self.store.subscribe(Table::UserEntries)),
                trigger(self.store.subscribe(Table::SrsStates)),
            ],
            move || {
                let snapshot: Arc<LoadedCatalog> = catalog.borrow().clone();
                due_for_deck(&snapshot, store.as_ref(), &deck_id, clock.today_epoch_day())
            },
        )
        .await
    }

    // ===== Queries =====

    pub fn today_epoch_day(&self) -> i64 {
        self.clock.today_epoch_day()
    }

    pub fn decks(&self) -> Vec<Deck> {
        self.catalog.borrow().decks.clone()
    }

    pub fn deck(&self, deck_id: &str) -> Option<Deck> {
        self.catalog
            .borrow()
            .decks
            .iter()
            .find(|d| d.deck_id == deck_id)
            .cloned()
    }

    pub async fn entries(&self, deck_id: &str) -> Result<Vec<Entry>> {
        let catalog = self.catalog_snapshot();
        let deck_id = deck_id.to_string();
        self.blocking(move |store| merged_entries(&catalog, store.as_ref(), &deck_id))
            .await
    }

    pub async fn entry(&self, deck_id: &str, entry_id: &str) -> Result<Option<Entry>> {
        let entries = self.entries(deck_id).await?;
        Ok(entries.into_iter().find(|e| e.entry_id() == entry_id))
    }

    pub async fn due_entries(&self, deck_id: &str) -> Result<Vec<Entry>> {
        let catalog = self.catalog_snapshot();
        let today = self.clock.today_epoch_day();
        let deck_id = deck_id.to_string();
        self.blocking(move |store| due_for_deck(&catalog, store.as_ref(), &deck_id, today))
            .await
    }

    /// Merged entries of a deck ranked against `query`
    pub async fn search(&self, deck_id: &str, query: &str) -> Result<Vec<Entry>> {
        let entries = self.entries(deck_id).await?;
        Ok(search::rank(&entries, query))
    }

    pub async fn srs_state(&self, deck_id: &str, entry_id: &str) -> Result<Option<SrsState>> {
        let deck_id = deck_id.to_string();
        let entry_id = entry_id.to_string();
        self.blocking(move |store| Ok(store.get_srs_state(&deck_id, &entry_id)?))
            .await
    }

    pub async fn wrong_counts(&self, deck_id: &str) -> Result<BTreeMap<String, u32>> {
        let deck_id = deck_id.to_string();
        self.blocking(move |store| Ok(store.wrong_counts(&deck_id)?)).await
    }

    pub async fn review_stats(&self, deck_id: &str) -> Result<ReviewStats> {
        let catalog = self.catalog_snapshot();
        let today = self.clock.today_epoch_day();
        let deck_id = deck_id.to_string();
        self.blocking(move |store| {
            let entries = merged_entries(&catalog, store.as_ref(), &deck_id)?;
            let states = store.list_srs_states(&deck_id)?;
            let events = store.list_review_events(&deck_id)?;
            Ok(srs::review_stats(&entries, &states, &events, today))
        })
        .await
    }

    /// Entries for one quiz session, `count` of them (all when `None`)
    pub async fn quiz_entries<R: Rng + ?Sized>(
        &self,
        deck_id: &str,
        category: &QuizCategory,
        count: Option<usize>,
        rng: &mut R,
    ) -> Result<Vec<Entry>> {
        let entries = self.entries(deck_id).await?;
        let wrong_counts = self.wrong_counts(deck_id).await?;
        Ok(select_quiz_entries(&entries, category, &wrong_counts, count, rng))
    }

    /// Wallpaper to display for a deck.
    ///
    /// A stored locator whose grant no longer holds falls back to the deck's
    /// bundled image, then to the default.
    pub async fn resolve_wallpaper(&self, deck_id: &str) -> Result<Wallpaper> {
        let owned_id = deck_id.to_string();
        let stored = self
            .blocking(move |store| Ok(store.get_wallpaper(&owned_id)?))
            .await?;

        if let Some(locator) = stored {
            if self.grants.is_accessible(&locator) {
                return Ok(Wallpaper::Custom(locator));
            }
            log::debug!(
                "repository: wallpaper {} for deck {} is no longer accessible",
                locator,
                deck_id
            );
        }

        Ok(self
            .deck(deck_id)
            .and_then(|deck| deck.image_name)
            .map_or(Wallpaper::Default, Wallpaper::DeckImage))
    }

    // ===== Writes =====

    /// Apply a review rating and persist the resulting state with its log record.
    ///
    /// Reviews are applied one at a time, so each one schedules from the state
    /// the previous one persisted.
    pub async fn review(&self, deck_id: &str, entry_id: &str, rating: ReviewRating) -> Result<SrsState> {
        let _guard = self.review_lock.lock().await;

        let today = self.clock.today_epoch_day();
        let now = self.clock.now_epoch_millis();
        let deck_id = deck_id.to_string();
        let entry_id = entry_id.to_string();

        self.write("review", move |store| {
            let current = store.get_srs_state(&deck_id, &entry_id)?;
            let next = srs::next_state(current.as_ref(), &deck_id, &entry_id, rating, today, now);
            let event = NewReviewEvent {
                deck_id,
                entry_id,
                outcome: rating.into(),
                reviewed_at_epoch_millis: now,
            };
            store.record_review(&next, &event)?;
            log::debug!(
                "repository: {}/{} rated {:?}, next due day {}",
                next.deck_id,
                next.entry_id,
                rating,
                next.due_epoch_day
            );
            Ok(next)
        })
        .await
    }

    /// Log a quiz answer. Review state is left untouched.
    pub async fn record_quiz_answer(&self, deck_id: &str, entry_id: &str, known: bool) -> Result<()> {
        let event = NewReviewEvent {
            deck_id: deck_id.to_string(),
            entry_id: entry_id.to_string(),
            outcome: ReviewOutcome::quiz(known),
            reviewed_at_epoch_millis: self.clock.now_epoch_millis(),
        };
        self.write("quiz answer", move |store| {
            store.append_review_event(&event)?;
            Ok(())
        })
        .await
    }

    /// Store or clear a deck's wallpaper; blank clears.
    ///
    /// The grant for the replaced locator is released afterwards. A failed
    /// release is logged and otherwise ignored.
    pub async fn set_deck_wallpaper(&self, deck_id: &str, locator: Option<&str>) -> Result<()> {
        let locator = locator
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let owned_id = deck_id.to_string();

        let previous = self
            .write("wallpaper update", move |store| {
                let previous = store.get_wallpaper(&owned_id)?;
                store.set_wallpaper(&owned_id, locator.as_deref())?;
                Ok(previous.filter(|p| locator.as_deref() != Some(p.as_str())))
            })
            .await?;

        if let Some(previous) = previous {
            if let Err(e) = self.grants.release(&previous) {
                log::warn!(
                    "repository: could not release wallpaper grant {} for deck {}: {}",
                    previous,
                    deck_id,
                    e
                );
            }
        }
        Ok(())
    }

    /// Create or replace a user-authored entry
    pub async fn save_user_entry(&self, mut row: UserEntryRow) -> Result<()> {
        row.deck_id = row.deck_id.trim().to_string();
        row.entry_id = row.entry_id.trim().to_string();
        if row.deck_id.is_empty() || row.entry_id.is_empty() || row.term.trim().is_empty() {
            return Err(RepositoryError::InvalidEntry(
                "deck id, entry id and term are required".to_string(),
            ));
        }
        if row.updated_at.trim().is_empty() {
            row.updated_at = DateTime::<Utc>::from_timestamp_millis(self.clock.now_epoch_millis())
                .map(|at| at.to_rfc3339())
                .unwrap_or_default();
        }

        self.write("user entry save", move |store| {
            store.upsert_user_entry(&row)?;
            Ok(())
        })
        .await
    }
}
