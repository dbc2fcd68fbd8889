//! Daily schedule generation.
//!
//! For each date the generator consults the holiday calendar, skips days that
//! already have a schedule, then assembles meal, cleaning and childcare tasks
//! in memory and hands the whole day to [`HouseholdStore::insert_day`]. A
//! failure at any step leaves nothing written for that date.

use crate::calendar::HolidayCalendar;
use crate::distribution;
use crate::persistence::{HouseholdStore, PersistenceError};
use crate::recipes::RecipeSelector;
use crate::task::NewTask;
use crate::timeutil;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const MAX_CLEANING_TASKS_PER_DAY: usize = 3;
pub const MEAL_DURATION_MINUTES: i64 = 60;
pub const CLEANING_DURATION_MINUTES: i64 = 30;
pub const CHILDCARE_TITLE: &str = "Childcare";

/// Source of "today" for the multi-day entry points.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Anything that can be reduced to a calendar day. Time-of-day is discarded.
pub trait IntoCalendarDay {
    fn into_calendar_day(self) -> NaiveDate;
}

impl IntoCalendarDay for NaiveDate {
    fn into_calendar_day(self) -> NaiveDate {
        self
    }
}

impl IntoCalendarDay for NaiveDateTime {
    fn into_calendar_day(self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> IntoCalendarDay for DateTime<Tz> {
    fn into_calendar_day(self) -> NaiveDate {
        self.date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    Calendar,
    DuplicateCheck,
    Meals,
    Cleaning,
    Childcare,
    Persist,
}

impl GenerationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStep::Calendar => "calendar",
            GenerationStep::DuplicateCheck => "duplicate_check",
            GenerationStep::Meals => "meals",
            GenerationStep::Cleaning => "cleaning",
            GenerationStep::Childcare => "childcare",
            GenerationStep::Persist => "persist",
        }
    }
}

impl fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{date}: loading holidays failed: {source}")]
    Calendar {
        date: NaiveDate,
        source: PersistenceError,
    },
    #[error("{date}: checking for an existing schedule failed: {source}")]
    DuplicateCheck {
        date: NaiveDate,
        source: PersistenceError,
    },
    #[error("{date}: building meal tasks failed: {source}")]
    Meals {
        date: NaiveDate,
        source: PersistenceError,
    },
    #[error("{date}: building cleaning tasks failed: {source}")]
    Cleaning {
        date: NaiveDate,
        source: PersistenceError,
    },
    #[error("{date}: building childcare tasks failed: {source}")]
    Childcare {
        date: NaiveDate,
        source: PersistenceError,
    },
    #[error("{date}: saving the day failed: {source}")]
    Persist {
        date: NaiveDate,
        source: PersistenceError,
    },
}

impl GenerationError {
    pub fn date(&self) -> NaiveDate {
        match self {
            GenerationError::Calendar { date, .. }
            | GenerationError::DuplicateCheck { date, .. }
            | GenerationError::Meals { date, .. }
            | GenerationError::Cleaning { date, .. }
            | GenerationError::Childcare { date, .. }
            | GenerationError::Persist { date, .. } => *date,
        }
    }

    pub fn step(&self) -> GenerationStep {
        match self {
            GenerationError::Calendar { .. } => GenerationStep::Calendar,
            GenerationError::DuplicateCheck { .. } => GenerationStep::DuplicateCheck,
            GenerationError::Meals { .. } => GenerationStep::Meals,
            GenerationError::Cleaning { .. } => GenerationStep::Cleaning,
            GenerationError::Childcare { .. } => GenerationStep::Childcare,
            GenerationError::Persist { .. } => GenerationStep::Persist,
        }
    }

    pub fn persistence_error(&self) -> &PersistenceError {
        match self {
            GenerationError::Calendar { source, .. }
            | GenerationError::DuplicateCheck { source, .. }
            | GenerationError::Meals { source, .. }
            | GenerationError::Cleaning { source, .. }
            | GenerationError::Childcare { source, .. }
            | GenerationError::Persist { source, .. } => source,
        }
    }
}

/// Summary of a day that was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDay {
    pub schedule_id: i64,
    pub date: NaiveDate,
    pub meal_tasks: usize,
    pub cleaning_tasks: usize,
    pub childcare_tasks: usize,
    pub meals_without_recipe: usize,
    pub warnings: Vec<String>,
}

impl GeneratedDay {
    pub fn total_tasks(&self) -> usize {
        self.meal_tasks + self.cleaning_tasks + self.childcare_tasks
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayDisposition {
    SkippedHoliday { date: NaiveDate, reason: String },
    SkippedDuplicate { date: NaiveDate },
    Generated(GeneratedDay),
}

impl DayDisposition {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayDisposition::SkippedHoliday { date, .. } => *date,
            DayDisposition::SkippedDuplicate { date } => *date,
            DayDisposition::Generated(day) => day.date,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, DayDisposition::Generated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDate {
    pub date: NaiveDate,
    pub step: GenerationStep,
    pub message: String,
}

/// Outcome of a multi-day run. A failed date never aborts its siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    pub generated: Vec<GeneratedDay>,
    pub skipped_holiday: Vec<NaiveDate>,
    pub skipped_duplicate: Vec<NaiveDate>,
    pub failed: Vec<FailedDate>,
}

impl RangeReport {
    pub fn record(&mut self, outcome: Result<DayDisposition, GenerationError>) {
        match outcome {
            Ok(DayDisposition::Generated(day)) => self.generated.push(day),
            Ok(DayDisposition::SkippedHoliday { date, .. }) => self.skipped_holiday.push(date),
            Ok(DayDisposition::SkippedDuplicate { date }) => self.skipped_duplicate.push(date),
            Err(err) => self.failed.push(FailedDate {
                date: err.date(),
                step: err.step(),
                message: err.to_string(),
            }),
        }
    }

    pub fn generated_dates(&self) -> Vec<NaiveDate> {
        self.generated.iter().map(|day| day.date).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut summary = format!(
            "generated={}, skipped_holiday={}, skipped_existing={}, failed={}",
            self.generated.len(),
            self.skipped_holiday.len(),
            self.skipped_duplicate.len(),
            self.failed.len()
        );
        for failure in &self.failed {
            summary.push_str(&format!(
                "\n  {} [{}]: {}",
                failure.date, failure.step, failure.message
            ));
        }
        summary
    }
}

struct MealPlan {
    tasks: Vec<NewTask>,
    without_recipe: usize,
}

pub struct ScheduleGenerator<S: ?Sized, R = StdRng> {
    store: Arc<S>,
    selector: RecipeSelector<R>,
    clock: Arc<dyn Clock>,
}

impl<S: HouseholdStore + ?Sized> ScheduleGenerator<S, StdRng> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }
}

impl<S: HouseholdStore + ?Sized, R: Rng> ScheduleGenerator<S, R> {
    pub fn with_rng(store: Arc<S>, rng: R) -> Self {
        Self {
            store,
            selector: RecipeSelector::new(rng),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Generates one day. Idempotent: a date that already has a schedule is
    /// reported as [`DayDisposition::SkippedDuplicate`] and left untouched.
    pub fn generate_for_date(
        &mut self,
        when: impl IntoCalendarDay,
    ) -> Result<DayDisposition, GenerationError> {
        let date = when.into_calendar_day();

        let calendar = self
            .store
            .holidays()
            .map(HolidayCalendar::new)
            .map_err(|source| GenerationError::Calendar { date, source })?;
        if let Some(reason) = calendar.non_working_reason(date) {
            info!(%date, %reason, "skipping non-working day");
            return Ok(DayDisposition::SkippedHoliday { date, reason });
        }

        let exists = self
            .store
            .schedule_exists(date)
            .map_err(|source| GenerationError::DuplicateCheck { date, source })?;
        if exists {
            info!(%date, "schedule already exists");
            return Ok(DayDisposition::SkippedDuplicate { date });
        }

        let meals = self
            .meal_tasks(date)
            .map_err(|source| GenerationError::Meals { date, source })?;
        let cleaning = self
            .cleaning_tasks(date)
            .map_err(|source| GenerationError::Cleaning { date, source })?;
        let mut warnings = Vec::new();
        let childcare = self
            .childcare_tasks(date, &mut warnings)
            .map_err(|source| GenerationError::Childcare { date, source })?;

        let meal_count = meals.tasks.len();
        let cleaning_count = cleaning.len();
        let childcare_count = childcare.len();
        let mut tasks = meals.tasks;
        tasks.extend(cleaning);
        tasks.extend(childcare);

        let schedule = match self.store.insert_day(date, true, &tasks) {
            Ok(schedule) => schedule,
            Err(PersistenceError::DuplicateDate(_)) => {
                info!(%date, "schedule created concurrently, keeping existing day");
                return Ok(DayDisposition::SkippedDuplicate { date });
            }
            Err(source) => return Err(GenerationError::Persist { date, source }),
        };

        info!(
            %date,
            schedule_id = schedule.id,
            meals = meal_count,
            cleaning = cleaning_count,
            childcare = childcare_count,
            "generated day schedule"
        );

        Ok(DayDisposition::Generated(GeneratedDay {
            schedule_id: schedule.id,
            date,
            meal_tasks: meal_count,
            cleaning_tasks: cleaning_count,
            childcare_tasks: childcare_count,
            meals_without_recipe: meals.without_recipe,
            warnings,
        }))
    }

    /// Generates `num_days` consecutive days from `start`, one at a time.
    pub fn generate_range(&mut self, start: NaiveDate, num_days: u32) -> RangeReport {
        let mut report = RangeReport::default();
        for offset in 0..num_days {
            let Some(date) = start.checked_add_days(Days::new(u64::from(offset))) else {
                warn!(%start, offset, "date range overflows the calendar, stopping");
                break;
            };
            let outcome = self.generate_for_date(date);
            if let Err(err) = &outcome {
                error!(%date, step = %err.step(), error = %err, "day generation failed");
            }
            report.record(outcome);
        }
        report
    }

    pub fn generate_for_next_days(&mut self, num_days: u32) -> RangeReport {
        let today = self.today();
        self.generate_range(today, num_days)
    }

    fn meal_tasks(&mut self, date: NaiveDate) -> Result<MealPlan, PersistenceError> {
        let slots = self.store.active_meal_slots()?;
        let recipes = self.store.recipes()?;
        let mut plan = MealPlan {
            tasks: Vec::with_capacity(slots.len()),
            without_recipe: 0,
        };

        for slot in &slots {
            let recipe = self.selector.select(&recipes, &slot.name, &slot.audience);
            if recipe.is_none() {
                warn!(%date, slot = %slot.name, audience = %slot.audience, "no eligible recipe");
                plan.without_recipe += 1;
            }
            plan.tasks.push(NewTask::meal(
                slot.task_title(),
                slot.default_time.clone(),
                MEAL_DURATION_MINUTES,
                recipe.map(|recipe| (recipe.id, recipe.name)),
            ));
        }
        Ok(plan)
    }

    fn cleaning_tasks(&self, date: NaiveDate) -> Result<Vec<NewTask>, PersistenceError> {
        let mut zones = self.store.cleaning_zones()?;
        // Stable, so equal priorities keep declaration order.
        zones.sort_by_key(|zone| zone.priority);

        let due: Vec<_> = zones
            .iter()
            .filter(|zone| distribution::should_clean_today(zone, date))
            .collect();
        if due.len() > MAX_CLEANING_TASKS_PER_DAY {
            debug!(%date, due = due.len(), "cleaning cap reached");
        }

        Ok(due
            .into_iter()
            .take(MAX_CLEANING_TASKS_PER_DAY)
            .map(|zone| {
                NewTask::cleaning(
                    zone.task_title(),
                    zone.description.clone(),
                    CLEANING_DURATION_MINUTES,
                    zone.id,
                )
            })
            .collect())
    }

    fn childcare_tasks(
        &self,
        date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<NewTask>, PersistenceError> {
        let entries = self.store.childcare_for(date)?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let duration =
                    match timeutil::try_elapsed_minutes(&entry.start_time, &entry.end_time) {
                        Ok(minutes) => minutes,
                        Err(err) => {
                            warn!(%date, entry = entry.id, error = %err, "childcare time unreadable, using zero duration");
                            warnings.push(format!("childcare entry {}: {err}", entry.id));
                            0
                        }
                    };
                NewTask::childcare(
                    CHILDCARE_TITLE,
                    entry.start_time,
                    entry.end_time,
                    duration,
                    entry.notes,
                )
            })
            .collect())
    }
}
