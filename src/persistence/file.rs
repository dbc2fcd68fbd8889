use super::{HouseholdStore, PersistenceError, PersistenceResult};
use crate::calendar::Holiday;
use crate::household::{ChildcareEntry, CleaningZone, MealSlot, Recipe};
use crate::task::DaySchedule;
use crate::validation;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Household configuration as exchanged in JSON files. Every collection is
/// optional in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSnapshot {
    #[serde(default)]
    pub meal_slots: Vec<MealSlot>,
    #[serde(default)]
    pub cleaning_zones: Vec<CleaningZone>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub childcare: Vec<ChildcareEntry>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

impl HouseholdSnapshot {
    pub fn validate(&self) -> PersistenceResult<()> {
        validation::validate_meal_slots(&self.meal_slots)
            .and_then(|_| validation::validate_zones(&self.cleaning_zones))
            .and_then(|_| validation::validate_recipes(&self.recipes))
            .and_then(|_| validation::validate_holidays(&self.holidays))
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub meal_slots: usize,
    pub cleaning_zones: usize,
    pub recipes: usize,
    pub childcare: usize,
    pub holidays: usize,
}

impl ImportSummary {
    pub fn of(snapshot: &HouseholdSnapshot) -> Self {
        Self {
            meal_slots: snapshot.meal_slots.len(),
            cleaning_zones: snapshot.cleaning_zones.len(),
            recipes: snapshot.recipes.len(),
            childcare: snapshot.childcare.len(),
            holidays: snapshot.holidays.len(),
        }
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "meal_slots={}, zones={}, recipes={}, childcare={}, holidays={}",
            self.meal_slots, self.cleaning_zones, self.recipes, self.childcare, self.holidays
        )
    }
}

pub fn load_household_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<HouseholdSnapshot> {
    let file = File::open(path)?;
    let snapshot: HouseholdSnapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Validates the snapshot, then writes it through
/// [`HouseholdStore::import_snapshot`]. A rejected record (for example an
/// explicit id the store already holds) leaves the store unchanged.
pub fn import_household<S: HouseholdStore + ?Sized>(
    store: &S,
    snapshot: HouseholdSnapshot,
) -> PersistenceResult<ImportSummary> {
    snapshot.validate()?;
    let summary = ImportSummary::of(&snapshot);
    store.import_snapshot(snapshot)?;
    info!(summary = %summary.to_cli_summary(), "household configuration imported");
    Ok(summary)
}

pub fn save_days_to_json<P: AsRef<Path>>(days: &[DaySchedule], path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, days)?;
    Ok(())
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    date: String,
    task_id: i64,
    kind: String,
    time: String,
    end_time: String,
    duration_minutes: i64,
    title: String,
    description: String,
    completed: bool,
    recipe_id: String,
    zone_id: String,
}

fn format_id(id: Option<i64>) -> String {
    id.map(|value| value.to_string()).unwrap_or_default()
}

/// One CSV row per task, days in the order given.
pub fn save_days_to_csv<P: AsRef<Path>>(days: &[DaySchedule], path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for day in days {
        for task in &day.tasks {
            writer.serialize(TaskCsvRecord {
                date: day.date.format("%Y-%m-%d").to_string(),
                task_id: task.id,
                kind: task.kind.as_str().to_string(),
                time: task.time.clone().unwrap_or_default(),
                end_time: task.end_time.clone().unwrap_or_default(),
                duration_minutes: task.duration_minutes,
                title: task.title.clone(),
                description: task.description.clone(),
                completed: task.completed,
                recipe_id: format_id(task.recipe_id),
                zone_id: format_id(task.zone_id),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
