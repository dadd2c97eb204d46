use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Source of "today" and "now" for scheduling.
///
/// Days are counted from 1970-01-01 in UTC, the same reckoning review
/// statistics use for study log timestamps.
pub trait Clock: Send + Sync {
    fn today_epoch_day(&self) -> i64;

    fn now_epoch_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_epoch_day(&self) -> i64 {
        self.now_epoch_millis().div_euclid(MILLIS_PER_DAY)
    }

    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct FixedClock {
    now_millis: AtomicI64,
}

impl FixedClock {
    pub fn at_day(epoch_day: i64) -> Self {
        Self {
            now_millis: AtomicI64::new(epoch_day * MILLIS_PER_DAY),
        }
    }

    pub fn set_millis(&self, epoch_millis: i64) {
        self.now_millis.store(epoch_millis, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.now_millis.fetch_add(days * MILLIS_PER_DAY, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today_epoch_day(&self) -> i64 {
        self.now_epoch_millis().div_euclid(MILLIS_PER_DAY)
    }

    fn now_epoch_millis(&self) -> i64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::at_day(20_000);
        assert_eq!(clock.today_epoch_day(), 20_000);
        clock.advance_days(3);
        assert_eq!(clock.today_epoch_day(), 20_003);
        clock.set_millis(-1);
        assert_eq!(clock.today_epoch_day(), -1);
    }

    #[test]
    fn test_system_clock_day_matches_millis() {
        let clock = SystemClock;
        let day = clock.today_epoch_day();
        assert!(day > 19_000);
    }
}
