//! Vocabulary decks and entries
//!
//! This module provides:
//! - Deck and entry models (entries tagged bundled or user-authored)
//! - The overlay merge of bundled entries with user edits
//! - Quiz entry selection

pub mod merge;
pub mod models;
pub mod quiz;

pub use merge::{deck_entry_counts, merge_entries};
pub use models::*;
pub use quiz::{select_quiz_entries, QuizCategory};
