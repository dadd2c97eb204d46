use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use wordhoard_lib::catalog::{directory_or_bundled, CatalogSource, DirectoryCatalog};
use wordhoard_lib::config::AppConfig;
use wordhoard_lib::repository::{FileGrants, Repository, SystemClock};
use wordhoard_lib::storage::SqliteStore;
use wordhoard_lib::vocab::Entry;

/// Paths given on the command line; each overrides the config file
pub struct AppOptions {
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub repo: Repository,
}

impl App {
    pub async fn new(options: &AppOptions) -> Result<Self> {
        let config = AppConfig::load(options.config.as_deref()).context("Failed to load config")?;

        // An explicit catalog must load; the default location may be empty
        let catalog: Arc<dyn CatalogSource> = match (&options.catalog, &config.catalog_dir) {
            (Some(dir), _) | (None, Some(dir)) => Arc::new(DirectoryCatalog::new(dir.clone())),
            (None, None) => directory_or_bundled(
                config.catalog_dir().context("Failed to get catalog directory")?,
            ),
        };
        let database_path = match &options.database {
            Some(path) => path.clone(),
            None => config.database_path().context("Failed to get database path")?,
        };

        let store = SqliteStore::open(database_path.clone())
            .with_context(|| format!("Failed to open database {}", database_path.display()))?;

        let repo = Repository::new(
            catalog,
            Arc::new(store),
            Arc::new(SystemClock),
            Arc::new(FileGrants),
        );

        // Commands that only touch user data still work without a catalog
        if let Err(e) = repo.initialize().await {
            eprintln!("warning: {}", e);
        }

        Ok(Self { config, repo })
    }

    /// Resolve a deck by id or name (case-insensitive prefix match).
    ///
    /// A deck that only exists as user entries is accepted by exact id.
    pub async fn find_deck_id(&self, name: &str) -> Result<String> {
        let decks = self.repo.decks();
        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(deck) = decks
            .iter()
            .find(|d| d.deck_id.to_lowercase() == name_lower || d.name.to_lowercase() == name_lower)
        {
            return Ok(deck.deck_id.clone());
        }

        let matches: Vec<_> = decks
            .iter()
            .filter(|d| {
                d.deck_id.to_lowercase().starts_with(&name_lower)
                    || d.name.to_lowercase().starts_with(&name_lower)
            })
            .collect();

        match matches.len() {
            1 => Ok(matches[0].deck_id.clone()),
            0 => {
                let user_entries = self
                    .repo
                    .entries(name)
                    .await
                    .context("Failed to read user entries")?;
                if !user_entries.is_empty() {
                    return Ok(name.to_string());
                }
                bail!(
                    "No deck matching '{}'. Available decks:\n{}",
                    name,
                    decks
                        .iter()
                        .map(|d| format!("  - {} ({})", d.name, d.deck_id))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            }
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                name,
                matches
                    .iter()
                    .map(|d| format!("  - {} ({})", d.name, d.deck_id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Find an entry by id, then by term (case-insensitive)
    pub async fn find_entry(&self, deck_id: &str, key: &str) -> Result<Entry> {
        let entries = self.repo.entries(deck_id).await.context("Failed to list entries")?;

        if let Some(entry) = entries.iter().find(|e| e.entry_id() == key) {
            return Ok(entry.clone());
        }

        let key_lower = key.to_lowercase();
        let matches: Vec<&Entry> = entries
            .iter()
            .filter(|e| e.sort_key() == key_lower || e.display_term().to_lowercase() == key_lower)
            .collect();

        match matches.len() {
            0 => bail!("No entry '{}' in deck {}", key, deck_id),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous entry '{}'. Matches:\n{}",
                key,
                matches
                    .iter()
                    .map(|e| format!("  - {} ({})", e.display_term(), e.entry_id()))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}
