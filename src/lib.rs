//! Vocabulary decks with a user overlay, spaced repetition and quizzes.

pub mod catalog;
pub mod config;
pub mod repository;
pub mod search;
pub mod srs;
pub mod storage;
pub mod vocab;

pub use repository::{Repository, RepositoryError};
