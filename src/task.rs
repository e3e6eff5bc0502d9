//! Deadline-bound to-do tasks

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

/// Formats accepted for a deadline written as a local date-time (e.g. what an HTML `datetime-local` input produces)
const LOCAL_DEADLINE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];


/// The identifier of a task, as assigned by the remote store.
///
/// This crate never makes up a `TaskId`: they only come from a remote store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.content
    }
}
impl From<String> for TaskId {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for TaskId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}
impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// The fields of a task, as stored in a remote document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub text: String,
    pub completed: bool,
    pub deadline: String,
}

impl TaskFields {
    /// The fields of a brand new (uncompleted) task
    pub fn new(text: String, deadline: String) -> Self {
        Self { text, completed: false, deadline }
    }
}


/// A partial field map: only the fields that are `Some` will be written to the remote store
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub deadline: Option<String>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }
    pub fn deadline(mut self, deadline: String) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none() && self.deadline.is_none()
    }

    /// Names of the fields this update touches, in a stable order
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.text.is_some()      { paths.push("text");      }
        if self.completed.is_some() { paths.push("completed"); }
        if self.deadline.is_some()  { paths.push("deadline");  }
        paths
    }

    /// Write the fields of this update over `fields`
    pub fn apply_to(&self, fields: &mut TaskFields) {
        if let Some(text) = &self.text {
            fields.text = text.clone();
        }
        if let Some(completed) = self.completed {
            fields.completed = completed;
        }
        if let Some(deadline) = &self.deadline {
            fields.deadline = deadline.clone();
        }
    }
}


/// A to-do task with a deadline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    text: String,
    completed: bool,
    /// Kept exactly as stored remotely. See [`parse_deadline`]
    deadline: String,
}

impl Task {
    /// Build a task from a remote document
    pub fn new(id: TaskId, fields: TaskFields) -> Self {
        Self {
            id,
            text: fields.text,
            completed: fields.completed,
            deadline: fields.deadline,
        }
    }

    pub fn id(&self) -> &TaskId     { &self.id        }
    pub fn text(&self) -> &str      { &self.text      }
    pub fn completed(&self) -> bool { self.completed  }
    pub fn deadline(&self) -> &str  { &self.deadline  }

    /// The instant of the deadline, or `None` in case it cannot be parsed
    pub fn deadline_time(&self) -> Option<DateTime<Utc>> {
        parse_deadline(&self.deadline)
    }

    /// Same as [`Self::deadline_time`], for offset-less deadlines written in `tz`
    pub fn deadline_time_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        parse_deadline_in(&self.deadline, tz)
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields {
            text: self.text.clone(),
            completed: self.completed,
            deadline: self.deadline.clone(),
        }
    }

    /// Returns a copy of this task, with `update` merged in. The ID is kept.
    pub fn merged_with(&self, update: &FieldUpdate) -> Self {
        let mut fields = self.fields();
        update.apply_to(&mut fields);
        Self::new(self.id.clone(), fields)
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}


/// Parse a deadline string into the instant it designates.
///
/// Date-times without an offset (`2030-01-01T09:00`, optionally with seconds and fractions) are local times.
/// RFC3339 timestamps (`2030-01-01T09:00:00Z`, `2030-01-01T09:00:00+07:00`) carry their own offset.
pub fn parse_deadline(deadline: &str) -> Option<DateTime<Utc>> {
    parse_deadline_in(deadline, &Local)
}

/// Same as [`parse_deadline`], with offset-less deadlines read as wall-clock times of `tz`.
///
/// A wall-clock time repeated when clocks go back is its earliest occurrence.
/// A wall-clock time skipped when clocks go forward is read one hour later.
pub fn parse_deadline_in<Tz: TimeZone>(deadline: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let deadline = deadline.trim();
    if deadline.is_empty() {
        return None;
    }

    for format in LOCAL_DEADLINE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(deadline, format) {
            return wall_clock_instant(naive, tz);
        }
    }

    DateTime::parse_from_rfc3339(deadline)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn wall_clock_instant<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
        other => other.earliest(),
    };
    resolved.map(|dt| dt.with_timezone(&Utc))
}
