pub mod calendar;
pub mod config;
pub mod distribution;
pub mod generator;
pub mod household;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod recipes;
pub mod service;
pub mod task;
pub mod timeutil;
mod validation;

pub use calendar::{Holiday, HolidayCalendar, cyprus_holidays, orthodox_easter};
pub use config::{ConfigError, PlannerConfig};
pub use distribution::{cleaning_days, cleaning_days_for, should_clean_today};
pub use generator::{
    Clock, DayDisposition, FailedDate, FixedClock, GeneratedDay, GenerationError, GenerationStep,
    IntoCalendarDay, RangeReport, ScheduleGenerator, SystemClock,
};
pub use household::{Audience, ChildcareEntry, CleaningZone, MealSlot, Priority, Recipe};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteHouseholdStore;
pub use persistence::{
    HouseholdSnapshot, HouseholdStore, ImportSummary, InMemoryStore, PersistenceError,
    PersistenceResult, import_household, load_household_from_json, save_days_to_csv,
    save_days_to_json,
};
pub use recipes::RecipeSelector;
pub use service::{PlannerService, RegenerationReport, SharedPlanner};
pub use task::{DaySchedule, NewTask, Task, TaskKind};
pub use timeutil::{TimeFormatError, elapsed_minutes, parse_hhmm, try_elapsed_minutes};
