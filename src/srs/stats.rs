use std::collections::HashMap;

use super::models::{ReviewEvent, ReviewStats, SrsPhase, SrsState};
use crate::vocab::Entry;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Review statistics over a deck's merged entries.
///
/// Entries without a state count as new and due. `reviews_today` counts every
/// study log record whose timestamp falls on `today_epoch_day` (UTC days).
pub fn review_stats(
    entries: &[Entry],
    states: &[SrsState],
    events: &[ReviewEvent],
    today_epoch_day: i64,
) -> ReviewStats {
    let by_entry: HashMap<&str, &SrsState> = states.iter().map(|s| (s.entry_id.as_str(), s)).collect();

    let mut stats = ReviewStats {
        total_entries: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        match by_entry.get(entry.entry_id()) {
            None => {
                stats.new_entries += 1;
                stats.due_entries += 1;
            }
            Some(state) => {
                match state.phase {
                    SrsPhase::New => stats.new_entries += 1,
                    SrsPhase::Learning => stats.learning_entries += 1,
                    SrsPhase::Review => stats.review_entries += 1,
                }
                if state.is_due(today_epoch_day) {
                    stats.due_entries += 1;
                }
            }
        }
    }

    for event in events {
        if event.reviewed_at_epoch_millis.div_euclid(MILLIS_PER_DAY) == today_epoch_day {
            stats.reviews_today += 1;
            if event.outcome.is_correct() {
                stats.correct_today += 1;
            }
        }
    }

    stats
}
