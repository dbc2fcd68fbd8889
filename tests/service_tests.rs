use chrono::NaiveDate;
use household_scheduler::{
    ChildcareEntry, CleaningZone, DaySchedule, FixedClock, Holiday, HouseholdSnapshot,
    HouseholdStore, InMemoryStore, MealSlot, NewTask, PersistenceError, PersistenceResult,
    PlannerService, Priority, Recipe, ScheduleGenerator, SharedPlanner, Task, cyprus_holidays,
};
use rand::rngs::mock::StepRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_meal_slot(MealSlot::new(0, "lunch", "13:00", "all"))
        .unwrap();
    store
        .insert_recipe(Recipe::new(0, "Soup", "lunch", "all"))
        .unwrap();
    store
        .insert_zone(CleaningZone::new(1, "Hall", 7, Priority::Medium))
        .unwrap();
    store
}

fn planner_at(store: Arc<InMemoryStore>, today: NaiveDate) -> PlannerService<InMemoryStore, StepRng> {
    household_scheduler::logging::init_test();
    PlannerService::from_generator(
        ScheduleGenerator::with_rng(store, StepRng::new(0, 0)).with_clock(FixedClock(today)),
    )
}

#[test]
fn next_days_and_upcoming_view() {
    let store = seeded_store();
    let planner = planner_at(store, d(2025, 3, 8));

    let report = planner.generate_for_next_days(7);
    assert_eq!(report.generated.len(), 6);
    assert_eq!(report.skipped_holiday, vec![d(2025, 3, 9)]);

    let upcoming = planner.upcoming(d(2025, 3, 8), 3).unwrap();
    let dates: Vec<NaiveDate> = upcoming.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![d(2025, 3, 8), d(2025, 3, 10)]);
    assert!(planner.day(d(2025, 3, 9)).unwrap().is_none());
    assert_eq!(planner.today(), d(2025, 3, 8));
}

#[test]
fn complete_and_uncomplete_task() {
    let store = seeded_store();
    let planner = planner_at(store, d(2025, 3, 11));
    planner.generate_for_date(d(2025, 3, 11)).unwrap();

    let day = planner.day(d(2025, 3, 11)).unwrap().unwrap();
    let task_id = day.tasks[0].id;
    assert!(planner.complete_task(task_id).unwrap().completed);
    assert_eq!(planner.day(d(2025, 3, 11)).unwrap().unwrap().completed_count(), 1);
    assert!(!planner.uncomplete_task(task_id).unwrap().completed);

    assert!(matches!(
        planner.complete_task(424_242),
        Err(PersistenceError::TaskNotFound(424_242))
    ));
}

#[test]
fn regenerate_replaces_days_in_range() {
    let store = seeded_store();
    let planner = planner_at(store.clone(), d(2025, 3, 10));
    planner.generate_for_next_days(3);

    let before = planner.day(d(2025, 3, 10)).unwrap().unwrap();
    planner.complete_task(before.tasks[0].id).unwrap();
    store
        .insert_zone(CleaningZone::new(2, "Stairs", 7, Priority::High))
        .unwrap();

    let result = planner.regenerate(d(2025, 3, 10), 2).unwrap();
    assert_eq!(result.cleared, 2);
    assert_eq!(result.report.generated.len(), 2);

    let after = planner.day(d(2025, 3, 10)).unwrap().unwrap();
    assert_ne!(after.id, before.id);
    assert_eq!(after.completed_count(), 0);
    assert_eq!(after.tasks.len(), before.tasks.len() + 1);
    // outside the range the old day is kept
    assert_eq!(
        planner.day(d(2025, 3, 12)).unwrap().unwrap().tasks.len(),
        before.tasks.len()
    );
}

#[test]
fn try_generate_runs_when_idle() {
    let store = seeded_store();
    let planner = planner_at(store, d(2025, 3, 10));
    let report = planner.try_generate_for_next_days(2).expect("generator is idle");
    assert_eq!(report.generated.len(), 2);
}

/// Holds the first `holidays()` call until the test releases it, so a
/// generation run can be parked while it owns the generator.
struct GatedStore {
    inner: InMemoryStore,
    armed: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl GatedStore {
    fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl HouseholdStore for GatedStore {
    fn active_meal_slots(&self) -> PersistenceResult<Vec<MealSlot>> {
        self.inner.active_meal_slots()
    }
    fn recipes(&self) -> PersistenceResult<Vec<Recipe>> {
        self.inner.recipes()
    }
    fn cleaning_zones(&self) -> PersistenceResult<Vec<CleaningZone>> {
        self.inner.cleaning_zones()
    }
    fn childcare_for(&self, date: NaiveDate) -> PersistenceResult<Vec<ChildcareEntry>> {
        self.inner.childcare_for(date)
    }
    fn holidays(&self) -> PersistenceResult<Vec<Holiday>> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.release.wait();
        }
        self.inner.holidays()
    }
    fn schedule_exists(&self, date: NaiveDate) -> PersistenceResult<bool> {
        self.inner.schedule_exists(date)
    }
    fn insert_day(
        &self,
        date: NaiveDate,
        generated: bool,
        tasks: &[NewTask],
    ) -> PersistenceResult<DaySchedule> {
        self.inner.insert_day(date, generated, tasks)
    }
    fn day_schedule(&self, date: NaiveDate) -> PersistenceResult<Option<DaySchedule>> {
        self.inner.day_schedule(date)
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
fn try_generate_skips_while_a_run_is_active() {
    household_scheduler::logging::init_test();
    let inner = InMemoryStore::new();
    inner
        .insert_meal_slot(MealSlot::new(0, "lunch", "13:00", "all"))
        .unwrap();
    let store = Arc::new(GatedStore::new(inner));
    let planner = Arc::new(PlannerService::from_generator(
        ScheduleGenerator::with_rng(store.clone(), StepRng::new(0, 0))
            .with_clock(FixedClock(d(2025, 3, 10))),
    ));

    let running = {
        let planner = Arc::clone(&planner);
        std::thread::spawn(move || planner.generate_for_next_days(2))
    };
    // the spawned run now holds the generator inside `holidays()`
    store.entered.wait();

    assert!(planner.try_generate_for_next_days(2).is_none());
    assert_eq!(store.inner.schedule_count(), 0);

    store.release.wait();
    let report = running.join().unwrap();
    assert_eq!(report.generated.len(), 2);
    assert_eq!(store.inner.schedule_count(), 2);

    // idle again
    let again = planner.try_generate_for_next_days(2).expect("generator is idle");
    assert_eq!(again.skipped_duplicate.len(), 2);
}

#[test]
fn concurrent_runs_never_duplicate_a_day() {
    let store = seeded_store();
    let planner = Arc::new(planner_at(store.clone(), d(2025, 3, 10)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let planner = Arc::clone(&planner);
            std::thread::spawn(move || planner.generate_for_next_days(5))
        })
        .collect();
    let generated: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().generated.len())
        .sum();

    assert_eq!(generated, 5);
    assert_eq!(store.schedule_count(), 5);
}

#[test]
fn seeding_holidays_skips_known_entries() {
    let store: Arc<dyn HouseholdStore> = Arc::new(InMemoryStore::new());
    let planner: SharedPlanner = PlannerService::new(store);

    assert_eq!(planner.seed_holidays(cyprus_holidays(2025)).unwrap(), 16);
    assert_eq!(planner.seed_holidays(cyprus_holidays(2025)).unwrap(), 0);
    let added = planner
        .seed_holidays(vec![Holiday::one_off("Name day", d(2025, 6, 29))])
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(planner.store().holidays().unwrap().len(), 17);
}
