//! Bundled, read-only deck content

pub mod bundled;
pub mod loader;
pub mod models;

use std::path::PathBuf;

use thiserror::Error;

pub use bundled::{directory_or_bundled, BundledCatalog};
pub use loader::{CatalogSource, DirectoryCatalog, LoadedCatalog};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck index not found: {}", .0.display())]
    IndexMissing(PathBuf),

    #[error("Deck file not found: {}", .0.display())]
    DeckFileMissing(PathBuf),

    #[error("Malformed deck file {}: {}", .path.display(), .source)]
    DeckParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Deck listed twice in index: {0}")]
    DuplicateDeck(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
