use super::{HouseholdSnapshot, HouseholdStore, PersistenceError, PersistenceResult, duplicate_id};
use crate::calendar::Holiday;
use crate::household::{ChildcareEntry, CleaningZone, MealSlot, Recipe};
use crate::task::{DaySchedule, NewTask, Task};
use chrono::NaiveDate;
use parking_lot::RwLock;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    meal_slots: Vec<MealSlot>,
    zones: Vec<CleaningZone>,
    recipes: Vec<Recipe>,
    childcare: Vec<ChildcareEntry>,
    holidays: Vec<Holiday>,
    schedules: Vec<DaySchedule>,
    next_id: i64,
}

impl MemoryState {
    fn assign_id(&mut self, requested: i64) -> i64 {
        if requested != 0 {
            self.next_id = self.next_id.max(requested);
            return requested;
        }
        self.next_id += 1;
        self.next_id
    }

    /// Like [`Self::assign_id`], but an explicit id already present among
    /// the entity's records is an error.
    fn claim_id(&mut self, requested: i64, taken: bool, entity: &str) -> PersistenceResult<i64> {
        if requested != 0 && taken {
            return Err(duplicate_id(entity, requested));
        }
        Ok(self.assign_id(requested))
    }

    fn add_meal_slot(&mut self, mut slot: MealSlot) -> PersistenceResult<MealSlot> {
        let taken = self.meal_slots.iter().any(|stored| stored.id == slot.id);
        slot.id = self.claim_id(slot.id, taken, "meal slot")?;
        self.meal_slots.push(slot.clone());
        Ok(slot)
    }

    fn add_zone(&mut self, mut zone: CleaningZone) -> PersistenceResult<CleaningZone> {
        let taken = self.zones.iter().any(|stored| stored.id == zone.id);
        zone.id = self.claim_id(zone.id, taken, "cleaning zone")?;
        self.zones.push(zone.clone());
        Ok(zone)
    }

    fn add_recipe(&mut self, mut recipe: Recipe) -> PersistenceResult<Recipe> {
        let taken = self.recipes.iter().any(|stored| stored.id == recipe.id);
        recipe.id = self.claim_id(recipe.id, taken, "recipe")?;
        self.recipes.push(recipe.clone());
        Ok(recipe)
    }

    fn add_childcare(&mut self, mut entry: ChildcareEntry) -> PersistenceResult<ChildcareEntry> {
        let taken = self.childcare.iter().any(|stored| stored.id == entry.id);
        entry.id = self.claim_id(entry.id, taken, "childcare entry")?;
        self.childcare.push(entry.clone());
        Ok(entry)
    }

    fn add_holiday(&mut self, mut holiday: Holiday) -> PersistenceResult<Holiday> {
        let taken = self.holidays.iter().any(|stored| stored.id == holiday.id);
        holiday.id = self.claim_id(holiday.id, taken, "holiday")?;
        self.holidays.push(holiday.clone());
        Ok(holiday)
    }

    fn task_mut(&mut self, task_id: i64) -> Option<&mut Task> {
        self.schedules
            .iter_mut()
            .flat_map(|schedule| schedule.tasks.iter_mut())
            .find(|task| task.id == task_id)
    }
}

/// Store backed by process memory. Readers and writers share one
/// `RwLock`, so a whole day is inserted under a single write guard.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_count(&self) -> usize {
        self.state.read().schedules.len()
    }
}

impl HouseholdStore for InMemoryStore {
    fn active_meal_slots(&self) -> PersistenceResult<Vec<MealSlot>> {
        let state = self.state.read();
        Ok(state
            .meal_slots
            .iter()
            .filter(|slot| slot.active)
            .cloned()
            .collect())
    }

    fn recipes(&self) -> PersistenceResult<Vec<Recipe>> {
        Ok(self.state.read().recipes.clone())
    }

    fn cleaning_zones(&self) -> PersistenceResult<Vec<CleaningZone>> {
        Ok(self.state.read().zones.clone())
    }

    fn childcare_for(&self, date: NaiveDate) -> PersistenceResult<Vec<ChildcareEntry>> {
        let state = self.state.read();
        Ok(state
            .childcare
            .iter()
            .filter(|entry| entry.date == date)
            .cloned()
            .collect())
    }

    fn holidays(&self) -> PersistenceResult<Vec<Holiday>> {
        Ok(self.state.read().holidays.clone())
    }

    fn schedule_exists(&self, date: NaiveDate) -> PersistenceResult<bool> {
        Ok(self
            .state
            .read()
            .schedules
            .iter()
            .any(|schedule| schedule.date == date))
    }

    fn insert_day(
        &self,
        date: NaiveDate,
        generated: bool,
        tasks: &[NewTask],
    ) -> PersistenceResult<DaySchedule> {
        super::validate_new_tasks(tasks)?;
        let mut state = self.state.write();
        if state.schedules.iter().any(|schedule| schedule.date == date) {
            return Err(PersistenceError::DuplicateDate(date));
        }

        let schedule_id = state.assign_id(0);
        let mut schedule = DaySchedule {
            id: schedule_id,
            date,
            generated,
            tasks: Vec::with_capacity(tasks.len()),
        };
        for new_task in tasks {
            let task_id = state.assign_id(0);
            schedule
                .tasks
                .push(Task::from_new(new_task, task_id, schedule_id));
        }

        state.schedules.push(schedule.clone());
        state.schedules.sort_by_key(|schedule| schedule.date);
        Ok(schedule)
    }

    fn day_schedule(&self, date: NaiveDate) -> PersistenceResult<Option<DaySchedule>> {
        Ok(self
            .state
            .read()
            .schedules
            .iter()
            .find(|schedule| schedule.date == date)
            .cloned())
    }

    fn schedules_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PersistenceResult<Vec<DaySchedule>> {
        Ok(self
            .state
            .read()
            .schedules
            .iter()
            .filter(|schedule| schedule.date >= start && schedule.date < end)
            .cloned()
            .collect())
    }

    fn set_task_completed(&self, task_id: i64, completed: bool) -> PersistenceResult<Task> {
        let mut state = self.state.write();
        let task = state
            .task_mut(task_id)
            .ok_or(PersistenceError::TaskNotFound(task_id))?;
        task.completed = completed;
        Ok(task.clone())
    }

    fn clear_range(&self, start: NaiveDate, end: NaiveDate) -> PersistenceResult<usize> {
        let mut state = self.state.write();
        let before = state.schedules.len();
        state
            .schedules
            .retain(|schedule| schedule.date < start || schedule.date >= end);
        Ok(before - state.schedules.len())
    }

    fn insert_meal_slot(&self, slot: MealSlot) -> PersistenceResult<MealSlot> {
        self.state.write().add_meal_slot(slot)
    }

    fn insert_zone(&self, zone: CleaningZone) -> PersistenceResult<CleaningZone> {
        self.state.write().add_zone(zone)
    }

    fn insert_recipe(&self, recipe: Recipe) -> PersistenceResult<Recipe> {
        self.state.write().add_recipe(recipe)
    }

    fn insert_childcare(&self, entry: ChildcareEntry) -> PersistenceResult<ChildcareEntry> {
        self.state.write().add_childcare(entry)
    }

    fn insert_holiday(&self, holiday: Holiday) -> PersistenceResult<Holiday> {
        self.state.write().add_holiday(holiday)
    }

    fn import_snapshot(&self, snapshot: HouseholdSnapshot) -> PersistenceResult<()> {
        let mut state = self.state.write();
        // Staged on a copy and swapped in only when every record was accepted.
        let mut staged = state.clone();
        for slot in snapshot.meal_slots {
            staged.add_meal_slot(slot)?;
        }
        for zone in snapshot.cleaning_zones {
            staged.add_zone(zone)?;
        }
        for recipe in snapshot.recipes {
            staged.add_recipe(recipe)?;
        }
        for entry in snapshot.childcare {
            staged.add_childcare(entry)?;
        }
        for holiday in snapshot.holidays {
            staged.add_holiday(holiday)?;
        }
        *state = staged;
        Ok(())
    }
}
