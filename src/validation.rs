use crate::calendar::Holiday;
use crate::household::{CleaningZone, MealSlot, Recipe};
use crate::task::{NewTask, TaskKind};
use crate::timeutil;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_new_task(task: &NewTask) -> Result<(), ValidationError> {
    if task.title.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "{} task requires a non-empty title",
            task.kind
        )));
    }

    match task.kind {
        TaskKind::Meal => {
            if task.time.is_none() {
                return Err(ValidationError::new(format!(
                    "meal task '{}' requires a time",
                    task.title
                )));
            }
            if task.duration_minutes < 0 {
                return Err(ValidationError::new(format!(
                    "meal task '{}' has negative duration {}",
                    task.title, task.duration_minutes
                )));
            }
        }
        TaskKind::Cleaning => {
            if task.zone_id.is_none() {
                return Err(ValidationError::new(format!(
                    "cleaning task '{}' requires a zone",
                    task.title
                )));
            }
            if task.duration_minutes < 0 {
                return Err(ValidationError::new(format!(
                    "cleaning task '{}' has negative duration {}",
                    task.title, task.duration_minutes
                )));
            }
        }
        // Negative childcare spans (end before start) are stored as-is.
        TaskKind::Childcare => {
            if task.time.is_none() || task.end_time.is_none() {
                return Err(ValidationError::new(format!(
                    "childcare task '{}' requires start and end times",
                    task.title
                )));
            }
        }
    }

    Ok(())
}

pub fn validate_new_tasks(tasks: &[NewTask]) -> Result<(), ValidationError> {
    tasks.iter().try_for_each(validate_new_task)
}

fn check_unique_ids<I>(entity: &str, ids: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = i64>,
{
    let mut seen = HashSet::new();
    for id in ids.into_iter().filter(|id| *id != 0) {
        if !seen.insert(id) {
            return Err(ValidationError::new(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(())
}

pub fn validate_meal_slots(slots: &[MealSlot]) -> Result<(), ValidationError> {
    check_unique_ids("meal slot", slots.iter().map(|slot| slot.id))?;
    for slot in slots {
        if slot.name.trim().is_empty() {
            return Err(ValidationError::new("meal slot requires a non-empty name"));
        }
        timeutil::parse_hhmm(&slot.default_time).map_err(|err| {
            ValidationError::new(format!("meal slot '{}': {err}", slot.name))
        })?;
    }
    Ok(())
}

pub fn validate_zones(zones: &[CleaningZone]) -> Result<(), ValidationError> {
    check_unique_ids("cleaning zone", zones.iter().map(|zone| zone.id))?;
    if let Some(zone) = zones.iter().find(|zone| zone.name.trim().is_empty()) {
        return Err(ValidationError::new(format!(
            "cleaning zone {} requires a non-empty name",
            zone.id
        )));
    }
    Ok(())
}

pub fn validate_recipes(recipes: &[Recipe]) -> Result<(), ValidationError> {
    check_unique_ids("recipe", recipes.iter().map(|recipe| recipe.id))?;
    for recipe in recipes {
        if recipe.name.trim().is_empty() || recipe.category.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "recipe {} requires a name and a category",
                recipe.id
            )));
        }
    }
    Ok(())
}

pub fn validate_holidays(holidays: &[Holiday]) -> Result<(), ValidationError> {
    check_unique_ids("holiday", holidays.iter().map(|holiday| holiday.id))?;
    if let Some(holiday) = holidays.iter().find(|h| h.name.trim().is_empty()) {
        return Err(ValidationError::new(format!(
            "holiday on {} requires a non-empty name",
            holiday.date
        )));
    }
    Ok(())
}
