use super::{HouseholdSnapshot, HouseholdStore, PersistenceError, PersistenceResult, duplicate_id};
use crate::calendar::Holiday;
use crate::household::{Audience, ChildcareEntry, CleaningZone, MealSlot, Priority, Recipe};
use crate::task::{DaySchedule, NewTask, Task, TaskKind};
use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::sync::Mutex;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TASK_COLUMNS: &str = "id, schedule_id, task_type, time, end_time, duration_minutes, \
                            title, description, completed, recipe_id, zone_id";

pub struct SqliteHouseholdStore {
    connection: Mutex<Connection>,
}

impl SqliteHouseholdStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        connection.busy_timeout(BUSY_TIMEOUT)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS meal_slots (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                default_time TEXT NOT NULL,
                audience TEXT NOT NULL DEFAULT 'all',
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS cleaning_zones (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                frequency_per_week INTEGER NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium'
            );
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                audience TEXT NOT NULL DEFAULT 'all',
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS childcare_entries (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_childcare_date ON childcare_entries (date);
            CREATE TABLE IF NOT EXISTS holidays (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                recurring INTEGER NOT NULL DEFAULT 1,
                country TEXT
            );
            CREATE TABLE IF NOT EXISTS day_schedules (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL UNIQUE,
                generated INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS schedule_tasks (
                id INTEGER PRIMARY KEY,
                schedule_id INTEGER NOT NULL REFERENCES day_schedules (id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                task_type TEXT NOT NULL,
                time TEXT,
                end_time TEXT,
                duration_minutes INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                completed INTEGER NOT NULL DEFAULT 0,
                recipe_id INTEGER,
                zone_id INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_schedule ON schedule_tasks (schedule_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().expect("sqlite mutex poisoned")
    }

    fn requested_id(id: i64) -> Option<i64> {
        (id != 0).then_some(id)
    }

    fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
        let kind_label: String = row.get(2)?;
        let kind = kind_label.parse::<TaskKind>().map_err(|message| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                message.into(),
            )
        })?;
        Ok(Task {
            id: row.get(0)?,
            schedule_id: row.get(1)?,
            kind,
            time: row.get(3)?,
            end_time: row.get(4)?,
            duration_minutes: row.get(5)?,
            title: row.get(6)?,
            description: row.get(7)?,
            completed: row.get(8)?,
            recipe_id: row.get(9)?,
            zone_id: row.get(10)?,
        })
    }

    fn load_tasks(connection: &Connection, schedule_id: i64) -> PersistenceResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM schedule_tasks WHERE schedule_id = ?1 ORDER BY position, id"
        );
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map(params![schedule_id], Self::task_from_row)?;
        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    fn load_schedule_rows(
        connection: &Connection,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> PersistenceResult<Vec<DaySchedule>> {
        let mut stmt = connection.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok(DaySchedule {
                id: row.get(0)?,
                date: row.get(1)?,
                generated: row.get(2)?,
                tasks: Vec::new(),
            })
        })?;
        let mut schedules = Vec::new();
        for schedule in rows {
            let mut schedule = schedule?;
            schedule.tasks = Self::load_tasks(connection, schedule.id)?;
            schedules.push(schedule);
        }
        Ok(schedules)
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
        )
    }
    /// Runs a configuration insert, mapping a primary-key clash on an
    /// explicit id to [`PersistenceError::InvalidData`]. Returns the row id.
    fn insert_record(
        conn: &Connection,
        sql: &str,
        args: impl rusqlite::Params,
        entity: &str,
        requested: i64,
    ) -> PersistenceResult<i64> {
        match conn.execute(sql, args) {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(err) if requested != 0 && Self::is_unique_violation(&err) => {
                Err(duplicate_id(entity, requested))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_meal_slot(conn: &Connection, mut slot: MealSlot) -> PersistenceResult<MealSlot> {
        slot.id = Self::insert_record(
            conn,
            "INSERT INTO meal_slots (id, name, default_time, audience, active) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::requested_id(slot.id),
                slot.name,
                slot.default_time,
                slot.audience.as_str(),
                slot.active
            ],
            "meal slot",
            slot.id,
        )?;
        Ok(slot)
    }

    fn write_zone(conn: &Connection, mut zone: CleaningZone) -> PersistenceResult<CleaningZone> {
        zone.id = Self::insert_record(
            conn,
            "INSERT INTO cleaning_zones (id, name, description, frequency_per_week, priority) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::requested_id(zone.id),
                zone.name,
                zone.description,
                zone.weekly_frequency,
                zone.priority.as_str()
            ],
            "cleaning zone",
            zone.id,
        )?;
        Ok(zone)
    }

    fn write_recipe(conn: &Connection, mut recipe: Recipe) -> PersistenceResult<Recipe> {
        recipe.id = Self::insert_record(
            conn,
            "INSERT INTO recipes (id, name, category, audience, active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::requested_id(recipe.id),
                recipe.name,
                recipe.category,
                recipe.audience.as_str(),
                recipe.active
            ],
            "recipe",
            recipe.id,
        )?;
        Ok(recipe)
    }

    fn write_childcare(
        conn: &Connection,
        mut entry: ChildcareEntry,
    ) -> PersistenceResult<ChildcareEntry> {
        entry.id = Self::insert_record(
            conn,
            "INSERT INTO childcare_entries (id, date, start_time, end_time, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::requested_id(entry.id),
                entry.date,
                entry.start_time,
                entry.end_time,
                entry.notes
            ],
            "childcare entry",
            entry.id,
        )?;
        Ok(entry)
    }

    fn write_holiday(conn: &Connection, mut holiday: Holiday) -> PersistenceResult<Holiday> {
        holiday.id = Self::insert_record(
            conn,
            "INSERT INTO holidays (id, name, date, recurring, country) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Self::requested_id(holiday.id),
                holiday.name,
                holiday.date,
                holiday.recurring,
                holiday.country
            ],
            "holiday",
            holiday.id,
        )?;
        Ok(holiday)
    }
}

impl HouseholdStore for SqliteHouseholdStore {
    fn active_meal_slots(&self) -> PersistenceResult<Vec<MealSlot>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, default_time, audience, active FROM meal_slots \
             WHERE active = 1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MealSlot {
                id: row.get(0)?,
                name: row.get(1)?,
                default_time: row.get(2)?,
                audience: Audience::from(row.get::<_, String>(3)?),
                active: row.get(4)?,
            })
        })?;
        let mut slots = Vec::new();
        for slot in rows {
            slots.push(slot?);
        }
        Ok(slots)
    }

    fn recipes(&self) -> PersistenceResult<Vec<Recipe>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, category, audience, active FROM recipes ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Recipe {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                audience: Audience::from(row.get::<_, String>(3)?),
                active: row.get(4)?,
            })
        })?;
        let mut recipes = Vec::new();
        for recipe in rows {
            recipes.push(recipe?);
        }
        Ok(recipes)
    }

    fn cleaning_zones(&self) -> PersistenceResult<Vec<CleaningZone>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, frequency_per_week, priority FROM cleaning_zones \
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CleaningZone {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                weekly_frequency: row.get(3)?,
                priority: Priority::parse(&row.get::<_, String>(4)?),
            })
        })?;
        let mut zones = Vec::new();
        for zone in rows {
            zones.push(zone?);
        }
        Ok(zones)
    }

    fn childcare_for(&self, date: NaiveDate) -> PersistenceResult<Vec<ChildcareEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, date, start_time, end_time, notes FROM childcare_entries \
             WHERE date = ?1 ORDER BY start_time, id",
        )?;
        let rows = stmt.query_map(params![date], |row| {
            Ok(ChildcareEntry {
                id: row.get(0)?,
                date: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                notes: row.get(4)?,
            })
        })?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn holidays(&self) -> PersistenceResult<Vec<Holiday>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, name, date, recurring, country FROM holidays ORDER BY date, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Holiday {
                id: row.get(0)?,
                name: row.get(1)?,
                date: row.get(2)?,
                recurring: row.get(3)?,
                country: row.get(4)?,
            })
        })?;
        let mut holidays = Vec::new();
        for holiday in rows {
            holidays.push(holiday?);
        }
        Ok(holidays)
    }

    fn schedule_exists(&self, date: NaiveDate) -> PersistenceResult<bool> {
        let conn = self.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM day_schedules WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_day(
        &self,
        date: NaiveDate,
        generated: bool,
        tasks: &[NewTask],
    ) -> PersistenceResult<DaySchedule> {
        super::validate_new_tasks(tasks)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO day_schedules (date, generated) VALUES (?1, ?2)",
            params![date, generated],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if Self::is_unique_violation(&err) => {
                return Err(PersistenceError::DuplicateDate(date));
            }
            Err(err) => return Err(err.into()),
        }
        let schedule_id = tx.last_insert_rowid();

        let mut stored = Vec::with_capacity(tasks.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedule_tasks (schedule_id, position, task_type, time, end_time, \
                 duration_minutes, title, description, completed, recipe_id, zone_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)",
            )?;
            for (position, task) in tasks.iter().enumerate() {
                stmt.execute(params![
                    schedule_id,
                    position as i64,
                    task.kind.as_str(),
                    task.time,
                    task.end_time,
                    task.duration_minutes,
                    task.title,
                    task.description,
                    task.recipe_id,
                    task.zone_id,
                ])?;
                stored.push(Task::from_new(task, tx.last_insert_rowid(), schedule_id));
            }
        }

        tx.commit()?;
        Ok(DaySchedule {
            id: schedule_id,
            date,
            generated,
            tasks: stored,
        })
    }

    fn day_schedule(&self, date: NaiveDate) -> PersistenceResult<Option<DaySchedule>> {
        let conn = self.lock();
        let mut schedules = Self::load_schedule_rows(
            &conn,
            "SELECT id, date, generated FROM day_schedules WHERE date = ?1",
            params![date],
        )?;
        Ok(schedules.pop())
    }

    fn schedules_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PersistenceResult<Vec<DaySchedule>> {
        let conn = self.lock();
        Self::load_schedule_rows(
            &conn,
            "SELECT id, date, generated FROM day_schedules \
             WHERE date >= ?1 AND date < ?2 ORDER BY date ASC",
            params![start, end],
        )
    }

    fn set_task_completed(&self, task_id: i64, completed: bool) -> PersistenceResult<Task> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE schedule_tasks SET completed = ?1 WHERE id = ?2",
            params![completed, task_id],
        )?;
        if changed == 0 {
            return Err(PersistenceError::TaskNotFound(task_id));
        }
        let sql = format!("SELECT {TASK_COLUMNS} FROM schedule_tasks WHERE id = ?1");
        let task = conn.query_row(&sql, params![task_id], Self::task_from_row)?;
        Ok(task)
    }

    fn clear_range(&self, start: NaiveDate, end: NaiveDate) -> PersistenceResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM schedule_tasks WHERE schedule_id IN \
             (SELECT id FROM day_schedules WHERE date >= ?1 AND date < ?2)",
            params![start, end],
        )?;
        let removed = tx.execute(
            "DELETE FROM day_schedules WHERE date >= ?1 AND date < ?2",
            params![start, end],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    fn insert_meal_slot(&self, slot: MealSlot) -> PersistenceResult<MealSlot> {
        Self::write_meal_slot(&self.lock(), slot)
    }

    fn insert_zone(&self, zone: CleaningZone) -> PersistenceResult<CleaningZone> {
        Self::write_zone(&self.lock(), zone)
    }

    fn insert_recipe(&self, recipe: Recipe) -> PersistenceResult<Recipe> {
        Self::write_recipe(&self.lock(), recipe)
    }

    fn insert_childcare(&self, entry: ChildcareEntry) -> PersistenceResult<ChildcareEntry> {
        Self::write_childcare(&self.lock(), entry)
    }

    fn insert_holiday(&self, holiday: Holiday) -> PersistenceResult<Holiday> {
        Self::write_holiday(&self.lock(), holiday)
    }

    fn import_snapshot(&self, snapshot: HouseholdSnapshot) -> PersistenceResult<()> {
        let mut conn = self.lock();
        // Dropping the transaction on an early return rolls every insert back.
        let tx = conn.transaction()?;
        for slot in snapshot.meal_slots {
            Self::write_meal_slot(&tx, slot)?;
        }
        for zone in snapshot.cleaning_zones {
            Self::write_zone(&tx, zone)?;
        }
        for recipe in snapshot.recipes {
            Self::write_recipe(&tx, recipe)?;
        }
        for entry in snapshot.childcare {
            Self::write_childcare(&tx, entry)?;
        }
        for holiday in snapshot.holidays {
            Self::write_holiday(&tx, holiday)?;
        }
        tx.commit()?;
        Ok(())
    }
}
