//! Spreads a zone's weekly cleanings over fixed weekdays.
//!
//! Weekdays are numbered from Sunday: 0 = Sunday, 1 = Monday, ..., 6 = Saturday.
//! The pattern is a pure function of `(zone.id, zone.weekly_frequency)`.
//! Reassigning a zone's id therefore moves its cleaning days.

use crate::household::CleaningZone;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

pub const DAYS_PER_WEEK: i32 = 7;

pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn cleaning_days_for(zone: &CleaningZone) -> BTreeSet<u32> {
    cleaning_days(zone.id, zone.weekly_frequency)
}

/// `frequency >= 7` cleans daily, `frequency <= 0` never. Otherwise the
/// days start at `identity mod 7` and step by `7 / frequency`.
pub fn cleaning_days(identity: i64, weekly_frequency: i32) -> BTreeSet<u32> {
    if weekly_frequency >= DAYS_PER_WEEK {
        return (0..DAYS_PER_WEEK as u32).collect();
    }
    if weekly_frequency <= 0 {
        return BTreeSet::new();
    }

    let interval = i64::from(DAYS_PER_WEEK / weekly_frequency);
    let start = identity.rem_euclid(i64::from(DAYS_PER_WEEK));
    (0..i64::from(weekly_frequency))
        .map(|i| ((start + i * interval) % i64::from(DAYS_PER_WEEK)) as u32)
        .collect()
}

pub fn should_clean_today(zone: &CleaningZone, date: NaiveDate) -> bool {
    cleaning_days_for(zone).contains(&weekday_index(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_two_steps_by_three_days() {
        assert_eq!(cleaning_days(3, 2), BTreeSet::from([3, 6]));
    }

    #[test]
    fn frequency_three_wraps_past_saturday() {
        // start 6, interval 2 -> 6, 8 % 7, 10 % 7
        assert_eq!(cleaning_days(6, 3), BTreeSet::from([6, 1, 3]));
    }

    #[test]
    fn out_of_range_frequencies() {
        assert_eq!(cleaning_days(5, 7).len(), 7);
        assert_eq!(cleaning_days(5, 12).len(), 7);
        assert!(cleaning_days(5, 0).is_empty());
        assert!(cleaning_days(5, -2).is_empty());
    }
}
