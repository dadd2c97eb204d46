//! Review scheduling
//!
//! A fixed three-button heuristic:
//! - AGAIN: back to learning, next day, ease -0.2, one more lapse
//! - GOOD: 2 days out of learning, otherwise grow by the ease factor
//! - EASY: 4 days out of learning, otherwise grow faster than GOOD
//!
//! The transition is a pure function of its inputs so replaying a review
//! against the same prior state always yields the same result.

use super::models::{ReviewRating, SrsPhase, SrsState, MIN_EASE};

const GOOD_EASE_BONUS: f64 = 0.05;
const EASY_EASE_BONUS: f64 = 0.15;
const AGAIN_EASE_PENALTY: f64 = 0.2;

/// Compute the state following a review.
///
/// A missing `current` state is treated as a fresh NEW entry due today.
pub fn next_state(
    current: Option<&SrsState>,
    deck_id: &str,
    entry_id: &str,
    rating: ReviewRating,
    today_epoch_day: i64,
    now_epoch_millis: i64,
) -> SrsState {
    let base = current
        .cloned()
        .unwrap_or_else(|| SrsState::new(deck_id, entry_id, today_epoch_day));
    let fresh = matches!(base.phase, SrsPhase::New | SrsPhase::Learning);

    let (phase, ease, interval_days, lapse_count) = match rating {
        ReviewRating::Again => (
            SrsPhase::Learning,
            (base.ease - AGAIN_EASE_PENALTY).max(MIN_EASE),
            1,
            base.lapse_count + 1,
        ),
        ReviewRating::Good if fresh => (SrsPhase::Review, base.ease + GOOD_EASE_BONUS, 2, base.lapse_count),
        ReviewRating::Good => {
            let grown = scale_interval(base.interval_days, base.ease);
            (
                SrsPhase::Review,
                base.ease + GOOD_EASE_BONUS,
                grown.max(base.interval_days + 1),
                base.lapse_count,
            )
        }
        ReviewRating::Easy if fresh => (SrsPhase::Review, base.ease + EASY_EASE_BONUS, 4, base.lapse_count),
        ReviewRating::Easy => {
            let easy_ease = base.ease + EASY_EASE_BONUS;
            let grown = scale_interval(base.interval_days, easy_ease + EASY_EASE_BONUS);
            (
                SrsPhase::Review,
                easy_ease,
                grown.max(base.interval_days + 2),
                base.lapse_count,
            )
        }
    };

    SrsState {
        phase,
        ease: ease.max(MIN_EASE),
        interval_days,
        due_epoch_day: today_epoch_day + i64::from(interval_days),
        last_reviewed_at_epoch_millis: Some(now_epoch_millis),
        lapse_count,
        ..base
    }
}

/// `interval * factor`, rounded half up
fn scale_interval(interval_days: u32, factor: f64) -> u32 {
    (f64::from(interval_days) * factor + 0.5).floor() as u32
}

/// The interval each rating would produce, for display before answering
pub fn preview_intervals(current: Option<&SrsState>, today_epoch_day: i64) -> [(ReviewRating, u32); 3] {
    ReviewRating::ALL.map(|rating| {
        let next = next_state(current, "", "", rating, today_epoch_day, 0);
        (rating, next.interval_days)
    })
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
