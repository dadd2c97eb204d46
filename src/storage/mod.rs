//! Persisted study data
//!
//! User overlay rows, review states, the study log and deck wallpapers live
//! behind the [`StudyStore`] contract. [`SqliteStore`] is the on-disk backend;
//! [`MemoryStore`] keeps everything in process.

pub mod legacy;
pub mod memory_store;
pub mod models;
pub mod sqlite_store;
pub mod store;

pub use memory_store::MemoryStore;
pub use models::{Table, UserEntryRow};
pub use sqlite_store::SqliteStore;
pub use store::{ChangeFeed, Result, StoreError, StudyStore};
