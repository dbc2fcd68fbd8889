use crate::calendar::Holiday;
use crate::generator::{
    Clock, DayDisposition, GenerationError, IntoCalendarDay, RangeReport, ScheduleGenerator,
};
use crate::persistence::{HouseholdStore, PersistenceError, PersistenceResult};
use crate::task::{DaySchedule, Task};
use chrono::{Days, NaiveDate};
use parking_lot::Mutex;
use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Planner over a type-erased store, as shared by the HTTP and CLI front ends.
pub type SharedPlanner = PlannerService<dyn HouseholdStore>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerationReport {
    pub cleared: usize,
    pub report: RangeReport,
}

/// Owns the store and the generator. Generation runs are serialized through
/// one mutex; reads and completion toggles go straight to the store.
pub struct PlannerService<S: ?Sized, R = StdRng> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    generator: Mutex<ScheduleGenerator<S, R>>,
}

impl<S: HouseholdStore + ?Sized> PlannerService<S, StdRng> {
    pub fn new(store: Arc<S>) -> Self {
        Self::from_generator(ScheduleGenerator::new(store))
    }
}

impl<S: HouseholdStore + ?Sized, R: Rng> PlannerService<S, R> {
    pub fn from_generator(generator: ScheduleGenerator<S, R>) -> Self {
        Self {
            store: Arc::clone(generator.store()),
            clock: generator.clock(),
            generator: Mutex::new(generator),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn generate_for_date(
        &self,
        when: impl IntoCalendarDay,
    ) -> Result<DayDisposition, GenerationError> {
        self.generator.lock().generate_for_date(when)
    }

    pub fn generate_range(&self, start: NaiveDate, num_days: u32) -> RangeReport {
        self.generator.lock().generate_range(start, num_days)
    }

    pub fn generate_for_next_days(&self, num_days: u32) -> RangeReport {
        self.generator.lock().generate_for_next_days(num_days)
    }

    /// Like [`Self::generate_for_next_days`], but returns `None` instead of
    /// waiting when another run holds the generator.
    pub fn try_generate_for_next_days(&self, num_days: u32) -> Option<RangeReport> {
        let mut generator = self.generator.try_lock()?;
        Some(generator.generate_for_next_days(num_days))
    }

    pub fn day(&self, date: NaiveDate) -> PersistenceResult<Option<DaySchedule>> {
        self.store.day_schedule(date)
    }

    /// Stored schedules in `[start, start + days)`, ordered by date. Days
    /// without a schedule are simply absent.
    pub fn upcoming(&self, start: NaiveDate, days: u32) -> PersistenceResult<Vec<DaySchedule>> {
        let end = range_end(start, days)?;
        self.store.schedules_between(start, end)
    }

    pub fn complete_task(&self, task_id: i64) -> PersistenceResult<Task> {
        self.store.set_task_completed(task_id, true)
    }

    pub fn uncomplete_task(&self, task_id: i64) -> PersistenceResult<Task> {
        self.store.set_task_completed(task_id, false)
    }

    /// Drops every schedule in `[start, start + days)` and generates the range
    /// again. Holds the generator for the whole operation.
    pub fn regenerate(&self, start: NaiveDate, days: u32) -> PersistenceResult<RegenerationReport> {
        let end = range_end(start, days)?;
        let mut generator = self.generator.lock();
        let cleared = self.store.clear_range(start, end)?;
        info!(%start, %end, cleared, "cleared schedules for regeneration");
        let report = generator.generate_range(start, days);
        Ok(RegenerationReport { cleared, report })
    }

    /// Inserts holidays whose name and date are not already stored. Returns
    /// how many were added.
    pub fn seed_holidays(&self, holidays: Vec<Holiday>) -> PersistenceResult<usize> {
        let existing = self.store.holidays()?;
        let mut added = 0;
        for holiday in holidays {
            let known = existing
                .iter()
                .any(|stored| stored.name == holiday.name && stored.date == holiday.date);
            if known {
                continue;
            }
            self.store.insert_holiday(holiday)?;
            added += 1;
        }
        info!(added, "seeded holidays");
        Ok(added)
    }
}

fn range_end(start: NaiveDate, days: u32) -> PersistenceResult<NaiveDate> {
    start
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| {
            PersistenceError::InvalidData(format!("{days} days from {start} is out of range"))
        })
}
