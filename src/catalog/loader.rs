//! Loading of the bundled catalog
//!
//! Directory structure under the catalog root:
//! ```text
//! {catalog-root}/
//! └── decks/
//!     ├── index.json          # Deck index with a path per deck
//!     └── {deck-id}.json      # One document per deck
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::models::{DeckDocument, DeckIndexDocument};
use super::{CatalogError, Result};
use crate::vocab::{Deck, Entry};

/// Index path, relative to the catalog root
pub const INDEX_PATH: &str = "decks/index.json";

/// Prefix some indexes put in front of deck paths
const ASSETS_PREFIX: &str = "assets/";

/// Everything the catalog provides, loaded in one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedCatalog {
    pub decks: Vec<Deck>,
    pub entries_by_deck: HashMap<String, Vec<Entry>>,
}

/// Where bundled decks come from
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<LoadedCatalog>;
}

/// Catalog read from JSON documents under a directory
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Whether the root holds a deck index at all
    pub fn has_index(&self) -> bool {
        self.index_path().exists()
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_PATH)
    }

    fn deck_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative_deck_path(relative))
    }

    fn read_index(&self) -> Result<DeckIndexDocument> {
        let path = self.index_path();
        if !path.exists() {
            return Err(CatalogError::IndexMissing(path));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn read_deck(&self, relative: &str) -> Result<DeckDocument> {
        let path = self.deck_path(relative);
        if !path.exists() {
            return Err(CatalogError::DeckFileMissing(path));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| CatalogError::DeckParse { path, source })
    }
}

impl CatalogSource for DirectoryCatalog {
    fn load(&self) -> Result<LoadedCatalog> {
        let index = self.read_index()?;
        assemble(index, |relative| self.read_deck(relative))
    }
}

/// Build a catalog from a parsed index, reading each listed deck document
pub(crate) fn assemble<F>(index: DeckIndexDocument, mut read_deck: F) -> Result<LoadedCatalog>
where
    F: FnMut(&str) -> Result<DeckDocument>,
{
    log::debug!(
        "catalog: index schema {} generated {} lists {} decks",
        index.schema_version,
        index.generated_at,
        index.decks.len()
    );

    let mut catalog = LoadedCatalog::default();
    for item in &index.decks {
        if catalog.entries_by_deck.contains_key(&item.deck_id) {
            return Err(CatalogError::DuplicateDeck(item.deck_id.clone()));
        }

        let document = read_deck(&item.path)?;
        if document.deck.deck_id != item.deck_id {
            log::warn!(
                "catalog: deck file {} declares id '{}' but the index lists '{}'",
                item.path,
                document.deck.deck_id,
                item.deck_id
            );
        }

        let entries: Vec<Entry> = document
            .entries
            .into_iter()
            .map(|entry| entry.into_entry(&item.deck_id))
            .collect();
        log::info!("catalog: loaded deck {} ({} entries)", item.deck_id, entries.len());

        catalog.decks.push(item.to_deck());
        catalog.entries_by_deck.insert(item.deck_id.clone(), entries);
    }

    Ok(catalog)
}

/// Strip the optional `assets/` prefix from an index path
pub(crate) fn relative_deck_path(path: &str) -> &str {
    path.strip_prefix(ASSETS_PREFIX).unwrap_or(path)
}
