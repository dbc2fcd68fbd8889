use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Family-member scope of a meal slot or recipe.
///
/// `all` is a wildcard on the recipe side: an `all` recipe is eligible for
/// every slot audience. Any other string names a specific member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Audience {
    #[default]
    All,
    Member(String),
}

impl Audience {
    pub fn member(name: impl Into<String>) -> Self {
        Audience::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Audience::All => "all",
            Audience::Member(name) => name,
        }
    }

    /// True when a recipe for `self` may be served to `requested`.
    pub fn admits(&self, requested: &Audience) -> bool {
        matches!(self, Audience::All) || self == requested
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "all" {
            Audience::All
        } else {
            Audience::Member(trimmed.to_string())
        }
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::from(value.to_string())
    }
}

impl From<Audience> for String {
    fn from(value: Audience) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cleaning priority. Declaration order is the scheduling order, so the
/// derived `Ord` sorts high before medium before low. Unrecognised labels
/// land in `Other` and sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Other,
}

impl Priority {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other => "other",
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::parse(&value)
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// A configured recurring meal time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSlot {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// HH:MM
    pub default_time: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl MealSlot {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        default_time: impl Into<String>,
        audience: impl Into<Audience>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            default_time: default_time.into(),
            audience: audience.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Title given to the meal task generated from this slot.
    pub fn task_title(&self) -> String {
        format!("{} - {}", self.name, self.audience)
    }
}

/// A physical area with a weekly cleaning target.
///
/// `id` is load-bearing: it seeds the weekday distribution, so it must stay
/// stable across regenerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningZone {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weekly_frequency: i32,
    #[serde(default)]
    pub priority: Priority,
}

impl CleaningZone {
    pub fn new(id: i64, name: impl Into<String>, weekly_frequency: i32, priority: Priority) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            weekly_frequency,
            priority,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn task_title(&self) -> String {
        format!("Clean {}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Meal category; matched against the slot name.
    pub category: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Recipe {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        audience: impl Into<Audience>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            audience: audience.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A childcare block authored for one day. Imported as-is by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildcareEntry {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub notes: String,
}

impl ChildcareEntry {
    pub fn new(
        id: i64,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            notes: notes.into(),
        }
    }
}
