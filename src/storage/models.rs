use serde::{Deserialize, Serialize};

use crate::vocab::{Entry, EntryBody, Example, SourceQuote};

/// A user-authored entry edit, one per (deck, entry) pair.
///
/// Rich fields the overlay does not carry (collocations, idioms, etymology, ...)
/// come back empty when the row is turned into an [`Entry`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntryRow {
    pub deck_id: String,
    pub entry_id: String,
    pub term: String,
    #[serde(default)]
    pub display_term: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub meaning_en: String,
    #[serde(default)]
    pub meaning_ja: String,
    #[serde(default)]
    pub lore_note: String,
    #[serde(default)]
    pub canonical_translation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub confusables: Vec<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub source_quotes: Vec<SourceQuote>,
    #[serde(default)]
    pub updated_at: String,
}

impl UserEntryRow {
    pub fn new(deck_id: impl Into<String>, entry_id: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            deck_id: deck_id.into(),
            entry_id: entry_id.into(),
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn to_entry(&self) -> Entry {
        let body = EntryBody {
            deck_id: self.deck_id.clone(),
            entry_id: self.entry_id.clone(),
            term: self.term.clone(),
            display_term: self.display_term.clone(),
            pos: self.pos.clone(),
            meaning_en: self.meaning_en.clone(),
            meaning_ja: self.meaning_ja.clone(),
            lore_note: self.lore_note.clone(),
            canonical_translation: self.canonical_translation.clone(),
            tags: self.tags.clone(),
            synonyms: self.synonyms.clone(),
            confusables: self.confusables.clone(),
            examples: self.examples.clone(),
            source_quotes: self.source_quotes.clone(),
            updated_at: self.updated_at.clone(),
            ..Default::default()
        };
        Entry::User(body.with_display_default())
    }
}

/// Logical tables of the persisted store, each with its own change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserEntries,
    SrsStates,
    ReviewEvents,
    Wallpapers,
}
