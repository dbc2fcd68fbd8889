use chrono::{NaiveDate, TimeZone, Utc};
use household_scheduler::calendar::Holiday;
use household_scheduler::generator::{
    CHILDCARE_TITLE, DayDisposition, FixedClock, GenerationError, GenerationStep,
    ScheduleGenerator,
};
use household_scheduler::household::{ChildcareEntry, CleaningZone, MealSlot, Priority, Recipe};
use household_scheduler::persistence::{
    HouseholdSnapshot, HouseholdStore, InMemoryStore, PersistenceError, PersistenceResult,
};
use household_scheduler::task::{DaySchedule, NewTask, Task, TaskKind};
use rand::rngs::mock::StepRng;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tuesday() -> NaiveDate {
    date(2025, 3, 11)
}

fn generator_for<S: HouseholdStore + ?Sized>(store: Arc<S>) -> ScheduleGenerator<S, StepRng> {
    household_scheduler::logging::init_test();
    ScheduleGenerator::with_rng(store, StepRng::new(0, 0))
}

fn seed_meals(store: &InMemoryStore) {
    for slot in [
        MealSlot::new(0, "breakfast", "08:00", "all"),
        MealSlot::new(0, "lunch", "13:00", "all"),
        MealSlot::new(0, "dinner", "19:00", "all"),
    ] {
        store.insert_meal_slot(slot).unwrap();
    }
    for recipe in [
        Recipe::new(0, "Porridge", "breakfast", "all"),
        Recipe::new(0, "Soup", "lunch", "all"),
        Recipe::new(0, "Moussaka", "dinner", "all"),
    ] {
        store.insert_recipe(recipe).unwrap();
    }
}

/// A, C and E are daily, B falls on Tuesday and D (days 4 and 0) does not.
fn seed_cap_zones(store: &InMemoryStore) {
    for zone in [
        CleaningZone::new(1, "A", 7, Priority::Low),
        CleaningZone::new(2, "B", 1, Priority::High),
        CleaningZone::new(3, "C", 7, Priority::Medium),
        CleaningZone::new(4, "D", 2, Priority::High),
        CleaningZone::new(5, "E", 7, Priority::High).with_description("Sweep and mop"),
    ] {
        store.insert_zone(zone).unwrap();
    }
}

fn stored_day(store: &InMemoryStore, day: NaiveDate) -> DaySchedule {
    store
        .day_schedule(day)
        .unwrap()
        .expect("day schedule should exist")
}

#[test]
fn end_to_end_tuesday_schedule() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    seed_cap_zones(&store);
    let mut generator = generator_for(store.clone());

    let summary = match generator.generate_for_date(tuesday()).unwrap() {
        DayDisposition::Generated(summary) => summary,
        other => panic!("expected a generated day, got {other:?}"),
    };
    assert_eq!(summary.meal_tasks, 3);
    assert_eq!(summary.cleaning_tasks, 3);
    assert_eq!(summary.childcare_tasks, 0);
    assert_eq!(summary.meals_without_recipe, 0);
    assert!(summary.warnings.is_empty());

    let day = stored_day(&store, tuesday());
    assert!(day.generated);
    assert_eq!(day.id, summary.schedule_id);
    assert_eq!(day.tasks.len(), 6);
    assert_eq!(summary.total_tasks(), day.tasks.len());
    assert!(day.tasks.iter().all(|task| !task.completed));

    let meals: Vec<&Task> = day.tasks_of(TaskKind::Meal).collect();
    let titles: Vec<&str> = meals.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["breakfast - all", "lunch - all", "dinner - all"]);
    assert_eq!(meals[0].time.as_deref(), Some("08:00"));
    assert_eq!(meals[0].duration_minutes, 60);
    assert_eq!(meals[0].description, "Porridge");
    assert!(meals.iter().all(|t| t.recipe_id.is_some()));
}

#[test]
fn cleaning_cap_keeps_highest_priorities_in_declaration_order() {
    let store = Arc::new(InMemoryStore::new());
    seed_cap_zones(&store);
    let mut generator = generator_for(store.clone());

    generator.generate_for_date(tuesday()).unwrap();
    let day = stored_day(&store, tuesday());
    let cleaning: Vec<&Task> = day.tasks_of(TaskKind::Cleaning).collect();

    let zones: Vec<Option<i64>> = cleaning.iter().map(|t| t.zone_id).collect();
    assert_eq!(zones, vec![Some(2), Some(5), Some(3)]);
    let titles: Vec<&str> = cleaning.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Clean B", "Clean E", "Clean C"]);
    assert_eq!(cleaning[1].description, "Sweep and mop");
    assert!(cleaning.iter().all(|t| t.time.is_none() && t.duration_minutes == 30));
}

#[test]
fn generation_is_idempotent_per_date() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    seed_cap_zones(&store);
    let mut generator = generator_for(store.clone());

    assert!(generator.generate_for_date(tuesday()).unwrap().is_generated());
    let before = stored_day(&store, tuesday());

    let second = generator.generate_for_date(tuesday()).unwrap();
    assert_eq!(second, DayDisposition::SkippedDuplicate { date: tuesday() });
    assert_eq!(store.schedule_count(), 1);
    assert_eq!(stored_day(&store, tuesday()), before);
}

#[test]
fn datetime_input_is_normalized_to_its_day() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    let mut generator = generator_for(store.clone());

    let evening = tuesday().and_hms_opt(18, 45, 0).unwrap();
    let outcome = generator.generate_for_date(evening).unwrap();
    assert_eq!(outcome.date(), tuesday());

    let same_day_utc = Utc.with_ymd_and_hms(2025, 3, 11, 6, 0, 0).unwrap();
    assert_eq!(
        generator.generate_for_date(same_day_utc).unwrap(),
        DayDisposition::SkippedDuplicate { date: tuesday() }
    );
    assert_eq!(
        generator.generate_for_date(tuesday()).unwrap(),
        DayDisposition::SkippedDuplicate { date: tuesday() }
    );
}

#[test]
fn sunday_is_never_scheduled() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    let mut generator = generator_for(store.clone());

    let sunday = date(2025, 3, 9);
    let outcome = generator.generate_for_date(sunday).unwrap();
    assert!(matches!(outcome, DayDisposition::SkippedHoliday { date, .. } if date == sunday));
    assert!(!store.schedule_exists(sunday).unwrap());
}

#[test]
fn recurring_holiday_suppresses_any_year() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    store
        .insert_holiday(Holiday::recurring("Christmas Day", date(2020, 12, 25)))
        .unwrap();
    let mut generator = generator_for(store.clone());

    let christmas = date(2025, 12, 25);
    let outcome = generator.generate_for_date(christmas).unwrap();
    assert_eq!(
        outcome,
        DayDisposition::SkippedHoliday {
            date: christmas,
            reason: "holiday: Christmas Day".to_string()
        }
    );
    assert_eq!(store.schedule_count(), 0);
}

#[test]
fn one_off_holiday_only_blocks_its_year() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    store
        .insert_holiday(Holiday::one_off("Easter Monday", date(2025, 4, 21)))
        .unwrap();
    let mut generator = generator_for(store.clone());

    assert!(matches!(
        generator.generate_for_date(date(2025, 4, 21)).unwrap(),
        DayDisposition::SkippedHoliday { .. }
    ));
    // 2026-04-21 is a Tuesday and an ordinary working day
    assert!(generator.generate_for_date(date(2026, 4, 21)).unwrap().is_generated());
}

#[test]
fn meals_without_recipe_are_still_created() {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_meal_slot(MealSlot::new(0, "breakfast", "07:30", "kids"))
        .unwrap();
    store
        .insert_meal_slot(MealSlot::new(0, "supper", "20:00", "all"))
        .unwrap();
    store
        .insert_meal_slot(MealSlot::new(0, "brunch", "11:00", "all").inactive())
        .unwrap();
    store
        .insert_recipe(Recipe::new(0, "Cereal", "breakfast", "all"))
        .unwrap();
    let mut generator = generator_for(store.clone());

    let DayDisposition::Generated(summary) = generator.generate_for_date(tuesday()).unwrap() else {
        panic!("expected generated day");
    };
    assert_eq!(summary.meal_tasks, 2);
    assert_eq!(summary.meals_without_recipe, 1);

    let day = stored_day(&store, tuesday());
    let meals: Vec<&Task> = day.tasks_of(TaskKind::Meal).collect();
    assert_eq!(meals[0].title, "breakfast - kids");
    assert_eq!(meals[0].description, "Cereal");
    assert_eq!(meals[1].title, "supper - all");
    assert_eq!(meals[1].recipe_id, None);
    assert_eq!(meals[1].description, "");
}

#[test]
fn childcare_entries_become_timed_tasks() {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_childcare(ChildcareEntry::new(0, tuesday(), "09:00", "10:30", "Swimming"))
        .unwrap();
    store
        .insert_childcare(ChildcareEntry::new(0, tuesday(), "9am", "10:30", "Library"))
        .unwrap();
    store
        .insert_childcare(ChildcareEntry::new(0, date(2025, 3, 12), "15:00", "16:00", "Park"))
        .unwrap();
    let mut generator = generator_for(store.clone());

    let DayDisposition::Generated(summary) = generator.generate_for_date(tuesday()).unwrap() else {
        panic!("expected generated day");
    };
    assert_eq!(summary.childcare_tasks, 2);
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("9am"));

    let day = stored_day(&store, tuesday());
    let childcare: Vec<&Task> = day.tasks_of(TaskKind::Childcare).collect();
    assert_eq!(childcare[0].title, CHILDCARE_TITLE);
    assert_eq!(childcare[0].time.as_deref(), Some("09:00"));
    assert_eq!(childcare[0].end_time.as_deref(), Some("10:30"));
    assert_eq!(childcare[0].duration_minutes, 90);
    assert_eq!(childcare[0].description, "Swimming");
    assert_eq!(childcare[1].duration_minutes, 0);
}

#[test]
fn next_days_start_at_the_injected_clock() {
    let store = Arc::new(InMemoryStore::new());
    seed_meals(&store);
    let mut generator = generator_for(store.clone()).with_clock(FixedClock(date(2025, 3, 8)));

    let report = generator.generate_for_next_days(3);
    assert_eq!(report.generated_dates(), vec![date(2025, 3, 8), date(2025, 3, 10)]);
    assert_eq!(report.skipped_holiday, vec![date(2025, 3, 9)]);
    assert!(!report.has_failures());

    let again = generator.generate_for_next_days(3);
    assert!(again.generated.is_empty());
    assert_eq!(again.skipped_duplicate, vec![date(2025, 3, 8), date(2025, 3, 10)]);
}

/// Delegates to an in-memory store but fails selected operations.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_childcare_on: Option<NaiveDate>,
    fail_insert_on: Option<NaiveDate>,
    hide_existing: bool,
}

impl HouseholdStore for FlakyStore {
    fn active_meal_slots(&self) -> PersistenceResult<Vec<MealSlot>> {
        self.inner.active_meal_slots()
    }
    fn recipes(&self) -> PersistenceResult<Vec<Recipe>> {
        self.inner.recipes()
    }
    fn cleaning_zones(&self) -> PersistenceResult<Vec<CleaningZone>> {
        self.inner.cleaning_zones()
    }
    fn childcare_for(&self, day: NaiveDate) -> PersistenceResult<Vec<ChildcareEntry>> {
        if self.fail_childcare_on == Some(day) {
            return Err(PersistenceError::InvalidData("childcare table unavailable".into()));
        }
        self.inner.childcare_for(day)
    }
    fn holidays(&self) -> PersistenceResult<Vec<Holiday>> {
        self.inner.holidays()
    }
    fn schedule_exists(&self, day: NaiveDate) -> PersistenceResult<bool> {
        if self.hide_existing {
            return Ok(false);
        }
        self.inner.schedule_exists(day)
    }
    fn insert_day(
        &self,
        day: NaiveDate,
        generated: bool,
        tasks: &[NewTask],
    ) -> PersistenceResult<DaySchedule> {
        if self.fail_insert_on == Some(day) {
            return Err(PersistenceError::Io(std::io::Error::other("disk full")));
        }
        self.inner.insert_day(day, generated, tasks)
    }
    fn day_schedule(&self, day: NaiveDate) -> PersistenceResult<Option<DaySchedule>> {
        self.inner.day_schedule(day)
    }
    fn schedules_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PersistenceResult<Vec<DaySchedule>> {
        self.inner.schedules_between(start, end)
    }
    fn set_task_completed(&self, task_id: i64, completed: bool) -> PersistenceResult<Task> {
        self.inner.set_task_completed(task_id, completed)
    }
    fn clear_range(&self, start: NaiveDate, end: NaiveDate) -> PersistenceResult<usize> {
        self.inner.clear_range(start, end)
    }
    fn insert_meal_slot(&self, slot: MealSlot) -> PersistenceResult<MealSlot> {
        self.inner.insert_meal_slot(slot)
    }
    fn insert_zone(&self, zone: CleaningZone) -> PersistenceResult<CleaningZone> {
        self.inner.insert_zone(zone)
    }
    fn insert_recipe(&self, recipe: Recipe) -> PersistenceResult<Recipe> {
        self.inner.insert_recipe(recipe)
    }
    fn insert_childcare(&self, entry: ChildcareEntry) -> PersistenceResult<ChildcareEntry> {
        self.inner.insert_childcare(entry)
    }
    fn insert_holiday(&self, holiday: Holiday) -> PersistenceResult<Holiday> {
        self.inner.insert_holiday(holiday)
    }
    fn import_snapshot(&self, snapshot: HouseholdSnapshot) -> PersistenceResult<()> {
        self.inner.import_snapshot(snapshot)
    }
}

#[test]
fn batch_continues_past_failed_dates() {
    let store = Arc::new(FlakyStore {
        fail_childcare_on: Some(date(2025, 3, 11)),
        fail_insert_on: Some(date(2025, 3, 13)),
        ..FlakyStore::default()
    });
    seed_meals(&store.inner);
    seed_cap_zones(&store.inner);
    let mut generator = generator_for(store.clone());

    let report = generator.generate_range(date(2025, 3, 8), 7);
    assert_eq!(
        report.generated_dates(),
        vec![
            date(2025, 3, 8),
            date(2025, 3, 10),
            date(2025, 3, 12),
            date(2025, 3, 14)
        ]
    );
    assert_eq!(report.skipped_holiday, vec![date(2025, 3, 9)]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].date, date(2025, 3, 11));
    assert_eq!(report.failed[0].step, GenerationStep::Childcare);
    assert_eq!(report.failed[1].date, date(2025, 3, 13));
    assert_eq!(report.failed[1].step, GenerationStep::Persist);
    assert!(report.to_cli_summary().contains("failed=2"));

    // a failed date leaves no partial day behind
    assert!(!store.schedule_exists(date(2025, 3, 11)).unwrap());
    assert!(!store.schedule_exists(date(2025, 3, 13)).unwrap());
}

#[test]
fn single_date_failure_names_the_step() {
    let store = Arc::new(FlakyStore {
        fail_childcare_on: Some(tuesday()),
        ..FlakyStore::default()
    });
    seed_meals(&store.inner);
    let mut generator = generator_for(store.clone());

    let err = generator.generate_for_date(tuesday()).unwrap_err();
    assert!(matches!(err, GenerationError::Childcare { .. }));
    assert_eq!(err.date(), tuesday());
    assert!(matches!(err.persistence_error(), PersistenceError::InvalidData(_)));
    assert_eq!(store.inner.schedule_count(), 0);
}

#[test]
fn insert_race_is_reported_as_duplicate() {
    let store = Arc::new(FlakyStore {
        hide_existing: true,
        ..FlakyStore::default()
    });
    seed_meals(&store.inner);
    let mut generator = generator_for(store.clone());

    assert!(generator.generate_for_date(tuesday()).unwrap().is_generated());
    assert_eq!(
        generator.generate_for_date(tuesday()).unwrap(),
        DayDisposition::SkippedDuplicate { date: tuesday() }
    );
    assert_eq!(store.inner.schedule_count(), 1);
}
