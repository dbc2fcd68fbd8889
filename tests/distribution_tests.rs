use chrono::NaiveDate;
use household_scheduler::distribution::{
    cleaning_days, cleaning_days_for, should_clean_today, weekday_index,
};
use household_scheduler::household::{CleaningZone, Priority};
use std::collections::BTreeSet;

fn days(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

#[test]
fn weekday_index_starts_at_sunday() {
    assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()), 0);
    assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()), 2);
    assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()), 6);
}

#[test]
fn twice_weekly_zone_with_id_three() {
    assert_eq!(cleaning_days(3, 2), days(&[3, 6]));
}

#[test]
fn frequency_bounds() {
    assert_eq!(cleaning_days(5, 7), days(&[0, 1, 2, 3, 4, 5, 6]));
    assert_eq!(cleaning_days(5, 12), days(&[0, 1, 2, 3, 4, 5, 6]));
    assert!(cleaning_days(5, 0).is_empty());
    assert!(cleaning_days(5, -3).is_empty());
}

#[test]
fn distribution_is_deterministic_and_sized() {
    for id in 0..21 {
        for freq in 1..7 {
            let first = cleaning_days(id, freq);
            assert_eq!(first, cleaning_days(id, freq));
            assert_eq!(first.len(), freq as usize, "id {id} freq {freq}");
            assert!(first.iter().all(|day| *day < 7));
        }
    }
}

#[test]
fn zone_identity_seeds_the_pattern() {
    let zone = CleaningZone::new(3, "Bathroom", 2, Priority::High);
    let renumbered = CleaningZone::new(4, "Bathroom", 2, Priority::High);
    assert_eq!(cleaning_days_for(&zone), days(&[3, 6]));
    assert_eq!(cleaning_days_for(&renumbered), days(&[4, 0]));
    assert_ne!(cleaning_days_for(&zone), cleaning_days_for(&renumbered));
}

#[test]
fn once_weekly_zone_lands_on_id_mod_seven() {
    assert_eq!(cleaning_days(2, 1), days(&[2]));
    assert_eq!(cleaning_days(9, 1), days(&[2]));
}

#[test]
fn should_clean_today_uses_weekday() {
    let zone = CleaningZone::new(3, "Kitchen", 2, Priority::Medium);
    // Wednesday and Saturday
    assert!(should_clean_today(&zone, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()));
    assert!(should_clean_today(&zone, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()));
    assert!(!should_clean_today(&zone, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()));
}
