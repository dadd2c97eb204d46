//! Quiz entry selection
//!
//! Picks which merged entries a quiz session presents. The difficult category
//! leans on the wrong-answer counts recorded from earlier quiz answers.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::models::Entry;

const FREQUENT_TAGS: &[&str] = &[
    "frequent",
    "common",
    "core",
    "high_frequency",
    "highfrequency",
    "toeic700",
    "700",
];

const DIFFICULT_TAGS: &[&str] = &["advanced", "difficult", "hard", "toeic900", "900"];

/// Minimum size of the band-ordered fallback for the frequent category
const MIN_BAND_FALLBACK: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "letter", rename_all = "camelCase")]
pub enum QuizCategory {
    Random,
    Frequent,
    /// Entries whose term starts with the given prefix, alphabetically
    Alphabet(String),
    Difficult,
}

/// Choose and order entries for a quiz, then keep the first `count` (all when `None`).
pub fn select_quiz_entries<R: Rng + ?Sized>(
    entries: &[Entry],
    category: &QuizCategory,
    wrong_counts: &BTreeMap<String, u32>,
    count: Option<usize>,
    rng: &mut R,
) -> Vec<Entry> {
    if entries.is_empty() {
        return Vec::new();
    }

    let mut selected = match category {
        QuizCategory::Random => shuffled(entries, rng),
        QuizCategory::Alphabet(prefix) => {
            let prefix = prefix.to_lowercase();
            let mut matching: Vec<Entry> = entries
                .iter()
                .filter(|e| e.sort_key().starts_with(&prefix))
                .cloned()
                .collect();
            matching.sort_by_cached_key(Entry::sort_key);
            matching
        }
        QuizCategory::Frequent => select_frequent(entries, rng),
        QuizCategory::Difficult => select_difficult(entries, wrong_counts, rng),
    };

    if let Some(count) = count {
        selected.truncate(count);
    }
    selected
}

fn shuffled<R: Rng + ?Sized>(entries: &[Entry], rng: &mut R) -> Vec<Entry> {
    let mut out = entries.to_vec();
    out.shuffle(rng);
    out
}

fn select_frequent<R: Rng + ?Sized>(entries: &[Entry], rng: &mut R) -> Vec<Entry> {
    let frequent: Vec<Entry> = entries
        .iter()
        .filter(|e| has_any_tag(e.tags(), FREQUENT_TAGS))
        .cloned()
        .collect();
    if !frequent.is_empty() {
        return shuffled(&frequent, rng);
    }

    let has_bands = entries.iter().any(|e| toeic_band_rank(e.tags()) < 3);
    if !has_bands {
        return shuffled(entries, rng);
    }

    let mut banded = entries.to_vec();
    banded.sort_by_cached_key(|e| (toeic_band_rank(e.tags()), e.sort_key()));
    banded.truncate(MIN_BAND_FALLBACK.max(entries.len() / 2));
    banded
}

fn select_difficult<R: Rng + ?Sized>(
    entries: &[Entry],
    wrong_counts: &BTreeMap<String, u32>,
    rng: &mut R,
) -> Vec<Entry> {
    let mut scored: Vec<(u32, &Entry)> = entries
        .iter()
        .map(|e| (difficulty_score(e, wrong_counts), e))
        .filter(|(score, _)| *score > 0)
        .collect();

    if scored.is_empty() {
        return shuffled(entries, rng);
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, e)| e.clone()).collect()
}

/// Ten points per recorded wrong answer, plus one for a difficulty tag
pub fn difficulty_score(entry: &Entry, wrong_counts: &BTreeMap<String, u32>) -> u32 {
    let wrong = wrong_counts.get(entry.entry_id()).copied().unwrap_or(0);
    let tag_score = u32::from(has_any_tag(entry.tags(), DIFFICULT_TAGS));
    wrong * 10 + tag_score
}

fn has_any_tag(tags: &[String], wanted: &[&str]) -> bool {
    tags.iter()
        .map(|t| t.to_lowercase())
        .any(|t| wanted.contains(&t.as_str()))
}

fn toeic_band_rank(tags: &[String]) -> u8 {
    let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
    let has = |names: &[&str]| tags.iter().any(|t| names.contains(&t.as_str()));
    if has(&["toeic700", "700"]) {
        0
    } else if has(&["toeic800", "800"]) {
        1
    } else if has(&["toeic900", "900", "advanced"]) {
        2
    } else {
        3
    }
}
