use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Date format used for due dates, both on disk and on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque task identifier, unique within one user's collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh identifier of the form `t_<lowercase ulid>`.
    pub fn generate() -> Self {
        TaskId(format!("t_{}", Ulid::new().to_string().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        TaskId(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task priority. Stored as `""`, `"Low"`, `"Medium"` or `"High"`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    #[serde(rename = "")]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::validation(format!(
                "unknown priority '{}', expected none, low, medium or high",
                other
            ))),
        }
    }
}

/// Recurrence rule. Stored as `""`, `"Daily"`, `"Weekly"` or `"Monthly"`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Recurrence {
    #[default]
    #[serde(rename = "")]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn label(self) -> &'static str {
        match self {
            Recurrence::None => "",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Recurrence::None
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Recurrence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            other => Err(Error::validation(format!(
                "unknown recurrence '{}', expected none, daily, weekly or monthly",
                other
            ))),
        }
    }
}

/// Represents a single task in a user's collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "TaskRecord")]
pub struct Task {
    /// Unique identifier, never reused.
    pub id: TaskId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Due date. Written as an empty string when absent.
    #[serde(with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub recurrence: Recurrence,
    pub completed: bool,
    /// Due date for which this task already spawned its next occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawned_for: Option<NaiveDate>,
}

/// On-disk shape of a task as read back. Older records name the repeat rule
/// `recurring`; `recurrence` wins when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    title: String,
    #[serde(default, with = "due_date_format")]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    recurrence: Option<Recurrence>,
    #[serde(default)]
    recurring: Option<Recurrence>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    spawned_for: Option<NaiveDate>,
}

impl From<TaskRecord> for Task {
    fn from(r: TaskRecord) -> Self {
        Task {
            id: r.id,
            title: r.title,
            due_date: r.due_date,
            priority: r.priority,
            recurrence: r.recurrence.or(r.recurring).unwrap_or_default(),
            completed: r.completed,
            spawned_for: r.spawned_for,
        }
    }
}

impl Task {
    /// Builds a new, incomplete task from validated input.
    pub fn new(id: TaskId, new: NewTask) -> Result<Self> {
        Ok(Task {
            id,
            title: validate_title(&new.title)?,
            due_date: new.due_date,
            priority: new.priority,
            recurrence: new.recurrence,
            completed: false,
            spawned_for: None,
        })
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub recurrence: Recurrence,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..NewTask::default()
        }
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }
}

/// Partial update. Only `Some` fields are applied.
///
/// `due_date` is doubly optional: `Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub recurrence: Option<Recurrence>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.recurrence.is_none()
    }

    /// Applies the patch to `task`. Nothing is changed if the title is invalid.
    pub fn apply(&self, task: &mut Task) -> Result<()> {
        let title = match &self.title {
            Some(title) => Some(validate_title(title)?),
            None => None,
        };
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        Ok(())
    }
}

/// Returns the trimmed title, or a validation error if nothing is left.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("task title must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Parses a `YYYY-MM-DD` due date. An empty string means no due date.
pub fn parse_due_date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|e| Error::validation(format!("invalid due date '{}': {}. Use YYYY-MM-DD.", raw, e)))
}

/// Serde adapter for `dueDate`: `""` (or null) on disk is `None` in memory.
mod due_date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}
