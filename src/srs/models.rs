//! Data models for the spaced repetition system

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default ease for an entry that has never been reviewed
pub const DEFAULT_EASE: f64 = 2.5;

/// Ease never drops below this
pub const MIN_EASE: f64 = 1.3;

/// Coarse learning stage of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SrsPhase {
    /// Never reviewed
    New,
    /// Just introduced or forgotten
    Learning,
    /// Regular spaced review
    Review,
}

impl Default for SrsPhase {
    fn default() -> Self {
        Self::New
    }
}

impl SrsPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SrsPhase::New => "NEW",
            SrsPhase::Learning => "LEARNING",
            SrsPhase::Review => "REVIEW",
        }
    }

    /// Parse a stored phase label, falling back to `New` for anything unknown
    pub fn from_label(label: &str) -> Self {
        match label {
            "LEARNING" => SrsPhase::Learning,
            "REVIEW" => SrsPhase::Review,
            _ => SrsPhase::New,
        }
    }
}

/// Answer given during a scheduled review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewRating {
    Again,
    Good,
    Easy,
}

impl ReviewRating {
    pub const ALL: [ReviewRating; 3] = [ReviewRating::Again, ReviewRating::Good, ReviewRating::Easy];
}

impl FromStr for ReviewRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(ReviewRating::Again),
            "good" | "2" => Ok(ReviewRating::Good),
            "easy" | "3" => Ok(ReviewRating::Easy),
            other => Err(format!("unknown rating '{}', expected again, good or easy", other)),
        }
    }
}

/// Current spaced repetition state for one (deck, entry) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsState {
    pub deck_id: String,
    pub entry_id: String,
    #[serde(default)]
    pub phase: SrsPhase,
    /// Interval growth multiplier, floored at [`MIN_EASE`]
    pub ease: f64,
    /// Current interval in whole days
    pub interval_days: u32,
    /// Day (days since 1970-01-01) on or after which the entry is due
    pub due_epoch_day: i64,
    #[serde(default)]
    pub last_reviewed_at_epoch_millis: Option<i64>,
    /// Number of AGAIN answers so far
    #[serde(default)]
    pub lapse_count: u32,
}

impl SrsState {
    /// The state an entry is treated as having before its first review
    pub fn new(deck_id: impl Into<String>, entry_id: impl Into<String>, today_epoch_day: i64) -> Self {
        Self {
            deck_id: deck_id.into(),
            entry_id: entry_id.into(),
            phase: SrsPhase::New,
            ease: DEFAULT_EASE,
            interval_days: 0,
            due_epoch_day: today_epoch_day,
            last_reviewed_at_epoch_millis: None,
            lapse_count: 0,
        }
    }

    pub fn is_due(&self, today_epoch_day: i64) -> bool {
        self.due_epoch_day <= today_epoch_day
    }
}

/// Outcome label recorded in the study log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewOutcome {
    Again,
    Good,
    Easy,
    /// Quiz answer: the user knew the entry
    Known,
    /// Quiz answer: the user did not know the entry
    Unknown,
}

impl ReviewOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Again => "AGAIN",
            ReviewOutcome::Good => "GOOD",
            ReviewOutcome::Easy => "EASY",
            ReviewOutcome::Known => "KNOWN",
            ReviewOutcome::Unknown => "UNKNOWN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "AGAIN" => Some(ReviewOutcome::Again),
            "GOOD" => Some(ReviewOutcome::Good),
            "EASY" => Some(ReviewOutcome::Easy),
            "KNOWN" => Some(ReviewOutcome::Known),
            "UNKNOWN" => Some(ReviewOutcome::Unknown),
            _ => None,
        }
    }

    pub fn quiz(known: bool) -> Self {
        if known {
            ReviewOutcome::Known
        } else {
            ReviewOutcome::Unknown
        }
    }

    /// Whether the answer counts as recalled
    pub fn is_correct(&self) -> bool {
        !matches!(self, ReviewOutcome::Again | ReviewOutcome::Unknown)
    }
}

impl From<ReviewRating> for ReviewOutcome {
    fn from(rating: ReviewRating) -> Self {
        match rating {
            ReviewRating::Again => ReviewOutcome::Again,
            ReviewRating::Good => ReviewOutcome::Good,
            ReviewRating::Easy => ReviewOutcome::Easy,
        }
    }
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A study log record that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewEvent {
    pub deck_id: String,
    pub entry_id: String,
    pub outcome: ReviewOutcome,
    pub reviewed_at_epoch_millis: i64,
}

/// A stored study log record. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub id: i64,
    pub deck_id: String,
    pub entry_id: String,
    pub outcome: ReviewOutcome,
    pub reviewed_at_epoch_millis: i64,
}

impl ReviewEvent {
    pub fn from_new(id: i64, event: NewReviewEvent) -> Self {
        Self {
            id,
            deck_id: event.deck_id,
            entry_id: event.entry_id,
            outcome: event.outcome,
            reviewed_at_epoch_millis: event.reviewed_at_epoch_millis,
        }
    }
}

/// Statistics for a deck
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_entries: usize,
    pub new_entries: usize,
    pub learning_entries: usize,
    pub review_entries: usize,
    pub due_entries: usize,
    pub reviews_today: usize,
    pub correct_today: usize,
}
