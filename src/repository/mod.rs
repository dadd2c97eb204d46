//! Repository facade over the catalog and the study store
//!
//! This module provides:
//! - One-time catalog initialization
//! - Watch-based views that republish on every source change
//! - Review, quiz answer, wallpaper and user entry writes

pub mod clock;
pub mod facade;
pub mod grants;
pub mod queries;
mod signal;

use thiserror::Error;

use crate::storage::StoreError;

pub use clock::{Clock, FixedClock, SystemClock};
pub use facade::{Repository, Wallpaper};
pub use grants::{FileGrants, GrantError, NoopGrants, ResourceGrants};
pub use queries::due_entries;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Catalog failed to load: {0}")]
    CatalogLoad(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
