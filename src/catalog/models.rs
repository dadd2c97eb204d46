//! On-disk document shapes for the bundled catalog
//!
//! Keys are snake_case. Absent fields default to empty strings and lists;
//! unknown keys are ignored.

use serde::Deserialize;

use crate::vocab::{
    Deck, Entry, EntryBody, Example, ExpressionMeaning, SourceQuote, VerbPrepositionDetail,
};

#[derive(Debug, Clone, Deserialize)]
pub struct DeckIndexDocument {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub generated_at: String,
    pub decks: Vec<DeckIndexItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckIndexItem {
    pub deck_id: String,
    pub name: String,
    #[serde(default = "default_language")]
    pub language_primary: String,
    #[serde(default)]
    pub language_support: Vec<String>,
    pub version: i32,
    /// Location of the deck document, relative to the catalog root
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_name: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl DeckIndexItem {
    pub fn to_deck(&self) -> Deck {
        Deck {
            deck_id: self.deck_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            language_primary: self.language_primary.clone(),
            language_support: self.language_support.clone(),
            version: self.version,
            tags: self.tags.clone(),
            image_name: Some(self.image_name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckDocument {
    #[serde(default)]
    pub schema_version: String,
    pub deck: DeckHeader,
    #[serde(default)]
    pub entries: Vec<DeckEntryDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckHeader {
    pub deck_id: String,
    pub name: String,
    pub version: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionMeaningDocument {
    pub expression: String,
    #[serde(default)]
    pub meaning: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerbPrepositionDetailDocument {
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

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleDocument {
    pub text_en: String,
    #[serde(default)]
    pub text_ja: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceQuoteDocument {
    pub source: String,
    pub quote: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckEntryDocument {
    pub entry_id: String,
    pub term: String,
    #[serde(default)]
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
    pub verb_preposition_usages: Vec<ExpressionMeaningDocument>,
    #[serde(default)]
    pub verb_preposition_details: Vec<VerbPrepositionDetailDocument>,
    #[serde(default)]
    pub common_collocations: Vec<ExpressionMeaningDocument>,
    #[serde(default)]
    pub idioms: Vec<ExpressionMeaningDocument>,
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
    pub examples: Vec<ExampleDocument>,
    #[serde(default)]
    pub source_quotes: Vec<SourceQuoteDocument>,
    #[serde(default)]
    pub updated_at: String,
}

impl From<ExpressionMeaningDocument> for ExpressionMeaning {
    fn from(doc: ExpressionMeaningDocument) -> Self {
        Self {
            expression: doc.expression,
            meaning: doc.meaning,
        }
    }
}

impl From<VerbPrepositionDetailDocument> for VerbPrepositionDetail {
    fn from(doc: VerbPrepositionDetailDocument) -> Self {
        Self {
            expression: doc.expression,
            meaning_en: doc.meaning_en,
            meaning_ja: doc.meaning_ja,
            example_en: doc.example_en,
            example_ja: doc.example_ja,
        }
    }
}

impl DeckEntryDocument {
    /// Map a deck document entry to a bundled entry of `deck_id`
    pub fn into_entry(self, deck_id: &str) -> Entry {
        let body = EntryBody {
            deck_id: deck_id.to_string(),
            entry_id: self.entry_id,
            term: self.term,
            display_term: self.display_term,
            pronunciation_ipa: self.pronunciation_ipa,
            pos: self.pos,
            meaning_en: self.meaning_en,
            meaning_ja: self.meaning_ja,
            preposition_usages: self.preposition_usages,
            verb_preposition_usages: self.verb_preposition_usages.into_iter().map(Into::into).collect(),
            verb_preposition_details: self.verb_preposition_details.into_iter().map(Into::into).collect(),
            common_collocations: self.common_collocations.into_iter().map(Into::into).collect(),
            idioms: self.idioms.into_iter().map(Into::into).collect(),
            latin_etymology: self.latin_etymology,
            related_terms: self.related_terms,
            lore_note: self.lore_note,
            canonical_translation: self.canonical_translation,
            tags: self.tags,
            synonyms: self.synonyms,
            confusables: self.confusables,
            examples: self
                .examples
                .into_iter()
                .map(|e| Example {
                    text_en: e.text_en,
                    text_ja: e.text_ja,
                })
                .collect(),
            source_quotes: self
                .source_quotes
                .into_iter()
                .map(|q| SourceQuote {
                    source: q.source,
                    quote: q.quote,
                })
                .collect(),
            updated_at: self.updated_at,
        };
        Entry::Bundled(body.with_display_default())
    }
}
