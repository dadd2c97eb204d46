//! Catalog compiled into the binary from `assets/decks`

use std::path::PathBuf;
use std::sync::Arc;

use super::loader::{assemble, relative_deck_path, INDEX_PATH};
use super::models::DeckDocument;
use super::{CatalogError, CatalogSource, DirectoryCatalog, LoadedCatalog, Result};

/// (path relative to the catalog root, document text)
const DOCUMENTS: &[(&str, &str)] = &[
    (INDEX_PATH, include_str!("../../assets/decks/index.json")),
    (
        "decks/mtg_story.json",
        include_str!("../../assets/decks/mtg_story.json"),
    ),
    (
        "decks/toeic_core.json",
        include_str!("../../assets/decks/toeic_core.json"),
    ),
];

/// The decks shipped with the application
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl BundledCatalog {
    fn document(relative: &str) -> Result<&'static str> {
        DOCUMENTS
            .iter()
            .find(|(path, _)| *path == relative)
            .map(|(_, content)| *content)
            .ok_or_else(|| CatalogError::DeckFileMissing(PathBuf::from(relative)))
    }
}

impl CatalogSource for BundledCatalog {
    fn load(&self) -> Result<LoadedCatalog> {
        let index = serde_json::from_str(Self::document(INDEX_PATH)?)?;
        assemble(index, |path| {
            let relative = relative_deck_path(path);
            serde_json::from_str::<DeckDocument>(Self::document(relative)?).map_err(|source| {
                CatalogError::DeckParse {
                    path: PathBuf::from(relative),
                    source,
                }
            })
        })
    }
}

/// The directory catalog at `root` if it has an index, otherwise the bundled one
pub fn directory_or_bundled(root: PathBuf) -> Arc<dyn CatalogSource> {
    let directory = DirectoryCatalog::new(root);
    if directory.has_index() {
        Arc::new(directory)
    } else {
        log::info!("catalog: no deck index on disk, using bundled decks");
        Arc::new(BundledCatalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_decks_load() {
        let catalog = BundledCatalog.load().unwrap();
        let ids: Vec<&str> = catalog.decks.iter().map(|d| d.deck_id.as_str()).collect();
        assert_eq!(ids, vec!["mtg_story", "toeic_core"]);
        assert_eq!(catalog.entries_by_deck["mtg_story"].len(), 5);
        assert_eq!(catalog.entries_by_deck["toeic_core"].len(), 4);
    }

    #[test]
    fn test_empty_directory_falls_back_to_bundled() {
        let temp = TempDir::new().unwrap();
        let catalog = directory_or_bundled(temp.path().join("catalog")).load().unwrap();
        assert_eq!(catalog.decks.len(), 2);
    }

    #[test]
    fn test_directory_with_index_wins() {
        let temp = TempDir::new().unwrap();
        let decks = temp.path().join("decks");
        fs::create_dir_all(&decks).unwrap();
        fs::write(
            decks.join("index.json"),
            r#"{ "decks": [{ "deck_id": "own", "name": "Own", "version": 1, "path": "decks/own.json" }] }"#,
        )
        .unwrap();
        fs::write(
            decks.join("own.json"),
            r#"{ "deck": { "deck_id": "own", "name": "Own", "version": 1 }, "entries": [] }"#,
        )
        .unwrap();

        let catalog = directory_or_bundled(temp.path().to_path_buf()).load().unwrap();
        assert_eq!(catalog.decks.len(), 1);
        assert_eq!(catalog.decks[0].deck_id, "own");
    }
}
