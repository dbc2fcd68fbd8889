use crate::calendar::Holiday;
use crate::household::{ChildcareEntry, CleaningZone, MealSlot, Recipe};
use crate::task::{DaySchedule, NewTask, Task};
use crate::validation;
use chrono::NaiveDate;
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("a day schedule already exists for {0}")]
    DuplicateDate(NaiveDate),
    #[error("task {0} not found")]
    TaskNotFound(i64),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// The record store the generator reads configuration from and writes
/// generated days into.
///
/// Configuration inserts assign an id when the given one is 0 and keep it
/// otherwise, so zone identities survive re-imports. An explicit id already
/// held by a record of the same kind is rejected with
/// [`PersistenceError::InvalidData`].
pub trait HouseholdStore: Send + Sync {
    fn active_meal_slots(&self) -> PersistenceResult<Vec<MealSlot>>;
    fn recipes(&self) -> PersistenceResult<Vec<Recipe>>;
    /// Zones in declaration order.
    fn cleaning_zones(&self) -> PersistenceResult<Vec<CleaningZone>>;
    /// Entries dated exactly `date`.
    fn childcare_for(&self, date: NaiveDate) -> PersistenceResult<Vec<ChildcareEntry>>;
    fn holidays(&self) -> PersistenceResult<Vec<Holiday>>;

    fn schedule_exists(&self, date: NaiveDate) -> PersistenceResult<bool>;
    /// Atomically creates the day and all of its tasks. Returns
    /// [`PersistenceError::DuplicateDate`] if the date already has a schedule.
    fn insert_day(
        &self,
        date: NaiveDate,
        generated: bool,
        tasks: &[NewTask],
    ) -> PersistenceResult<DaySchedule>;
    fn day_schedule(&self, date: NaiveDate) -> PersistenceResult<Option<DaySchedule>>;
    /// Schedules with `start <= date < end`, ordered by date.
    fn schedules_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PersistenceResult<Vec<DaySchedule>>;
    fn set_task_completed(&self, task_id: i64, completed: bool) -> PersistenceResult<Task>;
    /// Deletes schedules (and their tasks) with `start <= date < end`.
    /// Returns the number of schedules removed.
    fn clear_range(&self, start: NaiveDate, end: NaiveDate) -> PersistenceResult<usize>;

    fn insert_meal_slot(&self, slot: MealSlot) -> PersistenceResult<MealSlot>;
    fn insert_zone(&self, zone: CleaningZone) -> PersistenceResult<CleaningZone>;
    fn insert_recipe(&self, recipe: Recipe) -> PersistenceResult<Recipe>;
    fn insert_childcare(&self, entry: ChildcareEntry) -> PersistenceResult<ChildcareEntry>;
    fn insert_holiday(&self, holiday: Holiday) -> PersistenceResult<Holiday>;
    /// Inserts every record of the snapshot, or none of them.
    fn import_snapshot(&self, snapshot: HouseholdSnapshot) -> PersistenceResult<()>;
}

pub(crate) fn duplicate_id(entity: &str, id: i64) -> PersistenceError {
    PersistenceError::InvalidData(format!("{entity} id {id} already exists"))
}

pub fn validate_new_tasks(tasks: &[NewTask]) -> PersistenceResult<()> {
    validation::validate_new_tasks(tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    HouseholdSnapshot, ImportSummary, import_household, load_household_from_json,
    save_days_to_csv, save_days_to_json,
};
pub use memory::InMemoryStore;
