//! Data models for decks and vocabulary entries

use serde::{Deserialize, Serialize};

/// A bundled deck. Decks only ever come from the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub deck_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub language_primary: String,
    #[serde(default)]
    pub language_support: Vec<String>,
    pub version: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub text_en: String,
    #[serde(default)]
    pub text_ja: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceQuote {
    pub source: String,
    pub quote: String,
}

/// An expression together with its gloss (collocations, idioms, phrasal usages)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionMeaning {
    pub expression: String,
    #[serde(default)]
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbPrepositionDetail {
    pub expression: String,
    #[serde(default)]
    pub meaning_en: String,
    #[serde(default)]
    pub meaning_ja: String,
    #[serde(default)]
    pub example_en: String,
    #[serde(default)]
    pub example_ja: String,
}

/// The payload shared by bundled and user-authored entries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBody {
    pub deck_id: String,
    pub entry_id: String,
    /// Canonical form, used for sorting and search
    pub term: String,
    /// Human-facing form; never blank once constructed through [`EntryBody::with_display_default`]
    pub display_term: String,
    #[serde(default)]
    pub pronunciation_ipa: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub meaning_en: String,
    #[serde(default)]
    pub meaning_ja: String,
    #[serde(default)]
    pub preposition_usages: Vec<String>,
    #[serde(default)]
    pub verb_preposition_usages: Vec<ExpressionMeaning>,
    #[serde(default)]
    pub verb_preposition_details: Vec<VerbPrepositionDetail>,
    #[serde(default)]
    pub common_collocations: Vec<ExpressionMeaning>,
    #[serde(default)]
    pub idioms: Vec<ExpressionMeaning>,
    #[serde(default)]
    pub latin_etymology: String,
    #[serde(default)]
    pub related_terms: Vec<String>,
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

impl EntryBody {
    pub fn new(deck_id: impl Into<String>, entry_id: impl Into<String>, term: impl Into<String>) -> Self {
        let term = term.into();
        Self {
            deck_id: deck_id.into(),
            entry_id: entry_id.into(),
            display_term: term.clone(),
            term,
            ..Default::default()
        }
    }

    /// Fill a blank display term from the canonical term
    pub fn with_display_default(mut self) -> Self {
        if self.display_term.trim().is_empty() {
            self.display_term = self.term.clone();
        }
        self
    }
}

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    Bundled,
    User,
}

/// A vocabulary entry tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Entry {
    /// Shipped with the content catalog
    Bundled(EntryBody),
    /// Authored by the user; replaces a bundled entry with the same id
    User(EntryBody),
}

impl Entry {
    pub fn body(&self) -> &EntryBody {
        match self {
            Entry::Bundled(body) | Entry::User(body) => body,
        }
    }

    pub fn into_body(self) -> EntryBody {
        match self {
            Entry::Bundled(body) | Entry::User(body) => body,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            Entry::Bundled(_) => Provenance::Bundled,
            Entry::User(_) => Provenance::User,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.body().entry_id
    }

    pub fn deck_id(&self) -> &str {
        &self.body().deck_id
    }

    pub fn term(&self) -> &str {
        &self.body().term
    }

    pub fn display_term(&self) -> &str {
        &self.body().display_term
    }

    pub fn tags(&self) -> &[String] {
        &self.body().tags
    }

    /// Lowercased term, the sort key shared by every entry listing
    pub fn sort_key(&self) -> String {
        self.term().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_display_term_defaults_to_term() {
        let mut body = EntryBody::new("mtg_story", "walk", "walk");
        body.display_term = "  ".to_string();
        assert_eq!(body.with_display_default().display_term, "walk");
    }

    #[test]
    fn test_entry_serializes_with_source_tag() {
        let entry = Entry::User(EntryBody::new("mtg_story", "mana", "Mana"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source"], "user");
        assert_eq!(json["entryId"], "mana");

        let back: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(back.provenance(), Provenance::User);
        assert_eq!(back.sort_key(), "mana");
    }
}
