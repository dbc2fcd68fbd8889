use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Meal,
    Cleaning,
    Childcare,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Meal => "meal",
            TaskKind::Cleaning => "cleaning",
            TaskKind::Childcare => "childcare",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "meal" => Ok(TaskKind::Meal),
            "cleaning" => Ok(TaskKind::Cleaning),
            "childcare" => Ok(TaskKind::Childcare),
            other => Err(format!("unknown task type '{other}'")),
        }
    }
}

/// A task as produced by the generator, before the store assigns ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub kind: TaskKind,
    pub time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: i64,
    pub title: String,
    pub description: String,
    pub recipe_id: Option<i64>,
    pub zone_id: Option<i64>,
}

impl NewTask {
    pub fn meal(
        title: impl Into<String>,
        time: impl Into<String>,
        duration_minutes: i64,
        recipe: Option<(i64, String)>,
    ) -> Self {
        let (recipe_id, description) = match recipe {
            Some((id, name)) => (Some(id), name),
            None => (None, String::new()),
        };
        Self {
            kind: TaskKind::Meal,
            time: Some(time.into()),
            end_time: None,
            duration_minutes,
            title: title.into(),
            description,
            recipe_id,
            zone_id: None,
        }
    }

    pub fn cleaning(
        title: impl Into<String>,
        description: impl Into<String>,
        duration_minutes: i64,
        zone_id: i64,
    ) -> Self {
        Self {
            kind: TaskKind::Cleaning,
            time: None,
            end_time: None,
            duration_minutes,
            title: title.into(),
            description: description.into(),
            recipe_id: None,
            zone_id: Some(zone_id),
        }
    }

    pub fn childcare(
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        duration_minutes: i64,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            kind: TaskKind::Childcare,
            time: Some(start.into()),
            end_time: Some(end.into()),
            duration_minutes,
            title: title.into(),
            description: notes.into(),
            recipe_id: None,
            zone_id: None,
        }
    }
}

/// A persisted task. `completed` is the only field mutated after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub schedule_id: i64,
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub duration_minutes: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<i64>,
}

impl Task {
    pub fn from_new(new: &NewTask, id: i64, schedule_id: i64) -> Self {
        Self {
            id,
            schedule_id,
            kind: new.kind,
            time: new.time.clone(),
            end_time: new.end_time.clone(),
            duration_minutes: new.duration_minutes,
            title: new.title.clone(),
            description: new.description.clone(),
            completed: false,
            recipe_id: new.recipe_id,
            zone_id: new.zone_id,
        }
    }
}

/// All tasks for one calendar date. At most one exists per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub id: i64,
    pub date: NaiveDate,
    pub generated: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl DaySchedule {
    pub fn tasks_of(&self, kind: TaskKind) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |task| task.kind == kind)
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks_of(kind).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }
}
