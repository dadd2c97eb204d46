use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;

use wordhoard_lib::catalog::{
    directory_or_bundled, CatalogError, CatalogSource, DirectoryCatalog, LoadedCatalog,
};
use wordhoard_lib::repository::{
    FixedClock, GrantError, NoopGrants, Repository, RepositoryError, ResourceGrants, Wallpaper,
};
use wordhoard_lib::srs::{NewReviewEvent, ReviewEvent, ReviewRating, SrsPhase, SrsState};
use wordhoard_lib::storage::{MemoryStore, SqliteStore, StoreError, StudyStore, Table, UserEntryRow};
use wordhoard_lib::vocab::{Deck, Entry, EntryBody, Provenance, QuizCategory};

const TODAY: i64 = 20_000;

struct CountingCatalog {
    catalog: LoadedCatalog,
    fail: bool,
    loads: AtomicUsize,
}

impl CountingCatalog {
    fn new(catalog: LoadedCatalog) -> Self {
        Self {
            catalog,
            fail: false,
            loads: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            catalog: LoadedCatalog::default(),
            fail: true,
            loads: AtomicUsize::new(0),
        }
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl CatalogSource for CountingCatalog {
    fn load(&self) -> wordhoard_lib::catalog::Result<LoadedCatalog> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        if self.fail {
            return Err(CatalogError::IndexMissing("decks/index.json".into()));
        }
        Ok(self.catalog.clone())
    }
}

#[derive(Default)]
struct RecordingGrants {
    revoked: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
    fail_release: bool,
}

impl ResourceGrants for RecordingGrants {
    fn is_accessible(&self, locator: &str) -> bool {
        !self.revoked.lock().unwrap().iter().any(|l| l == locator)
    }

    fn release(&self, locator: &str) -> Result<(), GrantError> {
        self.released.lock().unwrap().push(locator.to_string());
        if self.fail_release {
            return Err(GrantError::NotReleased(locator.to_string()));
        }
        Ok(())
    }
}

/// Reads go through; every write fails
struct ReadOnlyStore(MemoryStore);

fn refused() -> StoreError {
    StoreError::InvalidRow("store is read-only".to_string())
}

impl StudyStore for ReadOnlyStore {
    fn upsert_user_entry(&self, _row: &UserEntryRow) -> wordhoard_lib::storage::Result<()> {
        Err(refused())
    }
    fn get_user_entry(&self, deck_id: &str, entry_id: &str) -> wordhoard_lib::storage::Result<Option<UserEntryRow>> {
        self.0.get_user_entry(deck_id, entry_id)
    }
    fn list_user_entries(&self, deck_id: &str) -> wordhoard_lib::storage::Result<Vec<UserEntryRow>> {
        self.0.list_user_entries(deck_id)
    }
    fn list_all_user_entries(&self) -> wordhoard_lib::storage::Result<Vec<UserEntryRow>> {
        self.0.list_all_user_entries()
    }
    fn upsert_srs_state(&self, _state: &SrsState) -> wordhoard_lib::storage::Result<()> {
        Err(refused())
    }
    fn get_srs_state(&self, deck_id: &str, entry_id: &str) -> wordhoard_lib::storage::Result<Option<SrsState>> {
        self.0.get_srs_state(deck_id, entry_id)
    }
    fn list_srs_states(&self, deck_id: &str) -> wordhoard_lib::storage::Result<Vec<SrsState>> {
        self.0.list_srs_states(deck_id)
    }
    fn list_all_srs_states(&self) -> wordhoard_lib::storage::Result<Vec<SrsState>> {
        self.0.list_all_srs_states()
    }
    fn append_review_event(&self, _event: &NewReviewEvent) -> wordhoard_lib::storage::Result<ReviewEvent> {
        Err(refused())
    }
    fn list_review_events(&self, deck_id: &str) -> wordhoard_lib::storage::Result<Vec<ReviewEvent>> {
        self.0.list_review_events(deck_id)
    }
    fn set_wallpaper(&self, _deck_id: &str, _locator: Option<&str>) -> wordhoard_lib::storage::Result<()> {
        Err(refused())
    }
    fn get_wallpaper(&self, deck_id: &str) -> wordhoard_lib::storage::Result<Option<String>> {
        self.0.get_wallpaper(deck_id)
    }
    fn list_wallpapers(&self) -> wordhoard_lib::storage::Result<BTreeMap<String, String>> {
        self.0.list_wallpapers()
    }
    fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.0.subscribe(table)
    }
}

fn bundled(id: &str, term: &str, tags: &[&str]) -> Entry {
    let mut body = EntryBody::new("mtg", id, term);
    body.meaning_en = format!("bundled {}", term);
    body.tags = tags.iter().map(|t| t.to_string()).collect();
    Entry::Bundled(body)
}

fn sample_catalog() -> LoadedCatalog {
    let deck = Deck {
        deck_id: "mtg".to_string(),
        name: "MTG Story".to_string(),
        description: String::new(),
        language_primary: "en".to_string(),
        language_support: vec!["ja".to_string()],
        version: 1,
        tags: vec![],
        image_name: Some("mtg_cover".to_string()),
    };
    let mut entries_by_deck = HashMap::new();
    entries_by_deck.insert(
        "mtg".to_string(),
        vec![
            bundled("a", "Aether", &["advanced"]),
            bundled("b", "bolt", &[]),
            bundled("m", "mana", &["frequent"]),
        ],
    );
    LoadedCatalog {
        decks: vec![deck],
        entries_by_deck,
    }
}

struct Fixture {
    repo: Repository,
    source: Arc<CountingCatalog>,
    store: Arc<dyn StudyStore>,
    clock: Arc<FixedClock>,
}

fn fixture_with(store: Arc<dyn StudyStore>, grants: Arc<dyn ResourceGrants>) -> Fixture {
    let source = Arc::new(CountingCatalog::new(sample_catalog()));
    let clock = Arc::new(FixedClock::at_day(TODAY));
    let repo = Repository::new(source.clone(), store.clone(), clock.clone(), grants);
    Fixture {
        repo,
        source,
        store,
        clock,
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(MemoryStore::new()), Arc::new(NoopGrants))
}

fn ids(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(Entry::entry_id).collect()
}

async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F)
where
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("view did not update in time")
        .expect("view closed");
}

#[tokio::test]
async fn test_initialize_loads_catalog_once() {
    let f = fixture();

    let (first, second, third) = tokio::join!(f.repo.initialize(), f.repo.initialize(), f.repo.initialize());
    assert!(first.is_ok() && second.is_ok() && third.is_ok());
    f.repo.initialize().await.unwrap();

    assert_eq!(f.source.loads(), 1);
    assert_eq!(f.repo.decks().len(), 1);
    assert_eq!(f.repo.load_error(), None);
}

#[tokio::test]
async fn test_failed_load_leaves_empty_catalog() {
    let source = Arc::new(CountingCatalog::failing());
    let store: Arc<dyn StudyStore> = Arc::new(MemoryStore::new());
    let repo = Repository::new(source.clone(), store, Arc::new(FixedClock::at_day(TODAY)), Arc::new(NoopGrants));

    let (first, second) = tokio::join!(repo.initialize(), repo.initialize());
    assert!(matches!(first, Err(RepositoryError::CatalogLoad(_))));
    assert!(matches!(second, Err(RepositoryError::CatalogLoad(_))));
    assert!(matches!(repo.initialize().await, Err(RepositoryError::CatalogLoad(_))));
    assert_eq!(source.loads(), 1);
    assert!(repo.load_error().is_some());

    assert!(repo.observe_decks().await.unwrap().borrow().is_empty());

    // User data keeps working without a catalog
    repo.save_user_entry(UserEntryRow::new("mine", "x", "xylem")).await.unwrap();
    let entries = repo.entries("mine").await.unwrap();
    assert_eq!(ids(&entries), vec!["x"]);
}

#[tokio::test]
async fn test_views_created_before_initialize_pick_up_catalog() {
    let f = fixture();
    let mut decks = f.repo.observe_decks().await.unwrap();
    let mut entries = f.repo.observe_entries("mtg").await.unwrap();
    assert!(decks.borrow().is_empty());

    f.repo.initialize().await.unwrap();

    wait_until(&mut decks, |d| d.len() == 1).await;
    wait_until(&mut entries, |e| e.len() == 3).await;
}

#[tokio::test]
async fn test_entries_view_merges_overlay() {
    let f = fixture();
    f.repo.initialize().await.unwrap();
    let mut entries = f.repo.observe_entries("mtg").await.unwrap();
    let mut counts = f.repo.observe_deck_entry_counts().await.unwrap();
    assert_eq!(ids(&entries.borrow_and_update()), vec!["a", "b", "m"]);

    let mut edited = UserEntryRow::new("mtg", "b", "Bolt");
    edited.meaning_en = "user bolt".to_string();
    f.repo.save_user_entry(edited).await.unwrap();
    f.repo.save_user_entry(UserEntryRow::new("mtg", "c", "counterspell")).await.unwrap();

    wait_until(&mut entries, |e| e.len() == 4).await;
    let merged = entries.borrow().clone();
    assert_eq!(ids(&merged), vec!["a", "b", "c", "m"]);
    assert_eq!(merged[1].provenance(), Provenance::User);
    assert_eq!(merged[1].body().meaning_en, "user bolt");
    assert_eq!(merged[1].display_term(), "Bolt");
    assert_eq!(merged[0].provenance(), Provenance::Bundled);

    wait_until(&mut counts, |c| c.get("mtg") == Some(&4)).await;
}

#[tokio::test]
async fn test_entry_view_follows_edits() {
    let f = fixture();
    f.repo.initialize().await.unwrap();
    let mut entry = f.repo.observe_entry("mtg", "z").await.unwrap();
    assert_eq!(*entry.borrow_and_update(), None);

    f.repo.save_user_entry(UserEntryRow::new("mtg", "z", "zeal")).await.unwrap();
    wait_until(&mut entry, |e| e.is_some()).await;
    assert_eq!(entry.borrow().as_ref().map(Entry::term), Some("zeal"));
}

#[tokio::test]
async fn test_save_user_entry_rejects_blank_keys() {
    let f = fixture();
    let result = f.repo.save_user_entry(UserEntryRow::new("mtg", "  ", "term")).await;
    assert!(matches!(result, Err(RepositoryError::InvalidEntry(_))));
    let result = f.repo.save_user_entry(UserEntryRow::new("mtg", "x", " ")).await;
    assert!(matches!(result, Err(RepositoryError::InvalidEntry(_))));
}

#[tokio::test]
async fn test_due_list_puts_unreviewed_first() {
    let f = fixture();
    f.repo.initialize().await.unwrap();

    // a: due in 2 days, m: due tomorrow, b: never reviewed
    f.repo.review("mtg", "a", ReviewRating::Good).await.unwrap();
    f.repo.review("mtg", "m", ReviewRating::Again).await.unwrap();

    let mut due = f.repo.observe_due_entries("mtg").await.unwrap();
    assert_eq!(ids(&due.borrow_and_update()), vec!["b"]);

    f.clock.advance_days(2);
    assert_eq!(ids(&f.repo.due_entries("mtg").await.unwrap()), vec!["b", "m", "a"]);

    // A state write republishes with the moved clock
    f.repo.review("mtg", "b", ReviewRating::Easy).await.unwrap();
    wait_until(&mut due, |d| d.len() == 2).await;
    assert_eq!(ids(&due.borrow()), vec!["m", "a"]);
}

#[tokio::test]
async fn test_reviews_build_on_persisted_state() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("study.db");
    {
        let store: Arc<dyn StudyStore> = Arc::new(SqliteStore::open(path.clone()).unwrap());
        let f = fixture_with(store, Arc::new(NoopGrants));

        let (first, second) = tokio::join!(
            f.repo.review("mtg", "a", ReviewRating::Good),
            f.repo.review("mtg", "a", ReviewRating::Good)
        );
        first.unwrap();
        second.unwrap();

        let state = f.repo.srs_state("mtg", "a").await.unwrap().unwrap();
        assert_eq!(state.phase, SrsPhase::Review);
        assert_eq!(state.interval_days, 5);
        assert!((state.ease - 2.6).abs() < 1e-9);
        assert_eq!(state.due_epoch_day, TODAY + 5);
        assert_eq!(f.store.list_review_events("mtg").unwrap().len(), 2);
    }

    let store = SqliteStore::open(path).unwrap();
    let state = store.get_srs_state("mtg", "a").unwrap().unwrap();
    assert_eq!(state.interval_days, 5);
    assert_eq!(state.last_reviewed_at_epoch_millis, Some(TODAY * 86_400_000));
}

#[tokio::test]
async fn test_wrong_counts_count_unknown_answers_only() {
    let f = fixture();
    f.repo.initialize().await.unwrap();
    let mut wrong = f.repo.observe_wrong_counts("mtg").await.unwrap();
    assert!(wrong.borrow_and_update().is_empty());

    f.repo.record_quiz_answer("mtg", "a", false).await.unwrap();
    f.repo.record_quiz_answer("mtg", "a", false).await.unwrap();
    f.repo.record_quiz_answer("mtg", "a", true).await.unwrap();
    f.repo.review("mtg", "b", ReviewRating::Again).await.unwrap();

    wait_until(&mut wrong, |w| w.get("a") == Some(&2)).await;
    assert_eq!(wrong.borrow().get("b"), None);

    // Quiz answers leave review state alone
    assert_eq!(f.repo.srs_state("mtg", "a").await.unwrap(), None);
}

#[tokio::test]
async fn test_difficult_quiz_prefers_missed_entries() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let f = fixture();
    f.repo.initialize().await.unwrap();
    f.repo.record_quiz_answer("mtg", "m", false).await.unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let picked = f
        .repo
        .quiz_entries("mtg", &QuizCategory::Difficult, None, &mut rng)
        .await
        .unwrap();
    assert_eq!(ids(&picked), vec!["m", "a"]);
}

#[tokio::test]
async fn test_review_stats_count_today() {
    let f = fixture();
    f.repo.initialize().await.unwrap();
    f.repo.review("mtg", "a", ReviewRating::Good).await.unwrap();
    f.repo.record_quiz_answer("mtg", "b", false).await.unwrap();

    let stats = f.repo.review_stats("mtg").await.unwrap();
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.review_entries, 1);
    assert_eq!(stats.new_entries, 2);
    assert_eq!(stats.due_entries, 2);
    assert_eq!(stats.reviews_today, 2);
    assert_eq!(stats.correct_today, 1);
}

#[tokio::test]
async fn test_search_ranks_merged_entries() {
    let f = fixture();
    f.repo.initialize().await.unwrap();
    f.repo.save_user_entry(UserEntryRow::new("mtg", "w", "manaweave")).await.unwrap();

    let results = f.repo.search("mtg", "MANA").await.unwrap();
    assert_eq!(ids(&results), vec!["m", "w"]);
    assert!(f.repo.search("mtg", "zzz").await.unwrap().is_empty());
    assert_eq!(f.repo.search("mtg", "  ").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_wallpaper_replacement_releases_previous_grant() {
    let grants = Arc::new(RecordingGrants::default());
    let f = fixture_with(Arc::new(MemoryStore::new()), grants.clone());
    f.repo.initialize().await.unwrap();
    let mut wallpapers = f.repo.observe_deck_wallpapers().await.unwrap();

    f.repo.set_deck_wallpaper("mtg", Some(" file:///a.png ")).await.unwrap();
    f.repo.set_deck_wallpaper("mtg", Some("file:///b.png")).await.unwrap();
    f.repo.set_deck_wallpaper("mtg", Some("file:///b.png")).await.unwrap();
    assert_eq!(*grants.released.lock().unwrap(), vec!["file:///a.png"]);
    wait_until(&mut wallpapers, |w| w.get("mtg").map(String::as_str) == Some("file:///b.png")).await;
    assert_eq!(
        f.repo.resolve_wallpaper("mtg").await.unwrap(),
        Wallpaper::Custom("file:///b.png".to_string())
    );

    f.repo.set_deck_wallpaper("mtg", Some("   ")).await.unwrap();
    assert_eq!(*grants.released.lock().unwrap(), vec!["file:///a.png", "file:///b.png"]);
    wait_until(&mut wallpapers, |w| w.is_empty()).await;
    assert_eq!(
        f.repo.resolve_wallpaper("mtg").await.unwrap(),
        Wallpaper::DeckImage("mtg_cover".to_string())
    );
}

#[tokio::test]
async fn test_revoked_wallpaper_falls_back() {
    let grants = Arc::new(RecordingGrants::default());
    let f = fixture_with(Arc::new(MemoryStore::new()), grants.clone());
    f.repo.initialize().await.unwrap();

    f.repo.set_deck_wallpaper("mtg", Some("content://gone")).await.unwrap();
    f.repo.set_deck_wallpaper("other", Some("content://gone-too")).await.unwrap();
    grants.revoked.lock().unwrap().push("content://gone".to_string());
    grants.revoked.lock().unwrap().push("content://gone-too".to_string());

    assert_eq!(
        f.repo.resolve_wallpaper("mtg").await.unwrap(),
        Wallpaper::DeckImage("mtg_cover".to_string())
    );
    assert_eq!(f.repo.resolve_wallpaper("other").await.unwrap(), Wallpaper::Default);
}

#[tokio::test]
async fn test_failed_grant_release_is_swallowed() {
    let grants = Arc::new(RecordingGrants {
        fail_release: true,
        ..Default::default()
    });
    let f = fixture_with(Arc::new(MemoryStore::new()), grants.clone());

    f.repo.set_deck_wallpaper("mtg", Some("file:///a.png")).await.unwrap();
    f.repo.set_deck_wallpaper("mtg", None).await.unwrap();
    assert_eq!(grants.released.lock().unwrap().len(), 1);
    assert_eq!(f.store.get_wallpaper("mtg").unwrap(), None);
}

#[tokio::test]
async fn test_write_failures_are_reported() {
    let f = fixture_with(Arc::new(ReadOnlyStore(MemoryStore::new())), Arc::new(NoopGrants));
    f.repo.initialize().await.unwrap();

    assert!(matches!(
        f.repo.review("mtg", "a", ReviewRating::Good).await,
        Err(RepositoryError::Store(_))
    ));
    assert!(matches!(
        f.repo.record_quiz_answer("mtg", "a", true).await,
        Err(RepositoryError::Store(_))
    ));
    assert!(matches!(
        f.repo.set_deck_wallpaper("mtg", Some("file:///a.png")).await,
        Err(RepositoryError::Store(_))
    ));
    assert!(matches!(
        f.repo.save_user_entry(UserEntryRow::new("mtg", "x", "x")).await,
        Err(RepositoryError::Store(_))
    ));
    assert_eq!(f.repo.srs_state("mtg", "a").await.unwrap(), None);
}

#[test]
fn test_bundled_assets_load() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    let catalog = DirectoryCatalog::new(root).load().unwrap();

    assert_eq!(catalog.decks.len(), 2);
    assert!(catalog.entries_by_deck["mtg_story"]
        .iter()
        .any(|e| e.entry_id() == "planeswalker"));
    assert_eq!(catalog.decks[1].image_name, None);
}

#[tokio::test]
async fn test_missing_catalog_dir_uses_bundled_decks() {
    let temp = TempDir::new().unwrap();
    let repo = Repository::new(
        directory_or_bundled(temp.path().join("catalog")),
        Arc::new(MemoryStore::new()),
        Arc::new(FixedClock::at_day(TODAY)),
        Arc::new(NoopGrants),
    );

    repo.initialize().await.unwrap();

    let ids: Vec<String> = repo.decks().into_iter().map(|d| d.deck_id).collect();
    assert_eq!(ids, vec!["mtg_story", "toeic_core"]);
    assert_eq!(repo.entries("toeic_core").await.unwrap().len(), 4);
}
