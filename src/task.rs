//! Task model and the in-memory task store.
//!
//! The store is pure data: it never touches storage or reads the clock on its
//! own. Callers pass the current time in, which keeps every operation
//! deterministic under test.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};

/// Maximum task text length, counted in characters after trimming
pub const MAX_TEXT_LEN: usize = 100;

/// First id handed out by an empty store
pub const FIRST_TASK_ID: TaskId = 1;

pub type TaskId = u64;

/// Alarm lifecycle of a scheduled task.
///
/// Moves `Armed -> Fired` at most once; nothing moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Off,
    Armed,
    Fired,
}

/// Due moment of a task. Date, time and alarm are set together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub alarm: AlarmState,
}

impl Schedule {
    /// Due moment at minute resolution
    pub fn due(&self) -> NaiveDateTime {
        self.due_date.and_time(self.due_time)
    }

    pub fn has_alarm(&self) -> bool {
        self.alarm != AlarmState::Off
    }

    pub fn alarm_triggered(&self) -> bool {
        self.alarm == AlarmState::Fired
    }

    /// Move an armed alarm to fired. Returns false if it was not armed.
    pub fn fire(&mut self) -> bool {
        if self.alarm != AlarmState::Armed {
            return false;
        }
        self.alarm = AlarmState::Fired;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub schedule: Option<Schedule>,
}

/// Scheduling input as entered by a user: either half may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleRequest {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub alarm: bool,
}

impl ScheduleRequest {
    /// Tomorrow at `default_time`, the form's prefilled values.
    pub fn defaults(now: DateTime<FixedOffset>, default_time: NaiveTime, alarm: bool) -> Self {
        let tomorrow = now.date_naive() + Duration::days(1);
        Self {
            date: Some(tomorrow),
            time: Some(default_time),
            alarm,
        }
    }

    fn validate(&self, now: DateTime<FixedOffset>) -> Result<Schedule, ValidationError> {
        let (Some(due_date), Some(time)) = (self.date, self.time) else {
            return Err(ValidationError::IncompleteSchedule);
        };
        let due_time = truncate_to_minute(time);
        let due = due_date.and_time(due_time);
        if due < now.naive_local() {
            return Err(ValidationError::DueInPast { due });
        }
        Ok(Schedule {
            due_date,
            due_time,
            alarm: if self.alarm {
                AlarmState::Armed
            } else {
                AlarmState::Off
            },
        })
    }
}

pub(crate) fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TextTooLong {
            len,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(text)
}

/// Ordered task collection, newest first, plus the id counter
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: TaskId,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: FIRST_TASK_ID,
        }
    }

    /// Build a store from loaded tasks.
    ///
    /// The counter is derived from the ids present, never from a persisted
    /// counter value. Duplicate ids are rejected.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, Error> {
        let mut seen = std::collections::HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id) {
                return Err(Error::CorruptRecord(format!("duplicate task id {}", task.id)));
            }
        }
        let next_id = match tasks.iter().map(|task| task.id).max() {
            Some(max) => max.checked_add(1).ok_or_else(|| {
                Error::CorruptRecord(format!("task id {max} leaves no room for another id"))
            })?,
            None => FIRST_TASK_ID,
        };
        Ok(Self { tasks, next_id })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Id the next added task will receive
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub(crate) fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    /// Validate input and prepend a new task.
    ///
    /// Nothing changes when validation fails, the id counter included.
    pub fn add(
        &mut self,
        text: &str,
        schedule: Option<ScheduleRequest>,
        now: DateTime<FixedOffset>,
    ) -> Result<&Task, ValidationError> {
        let text = validate_text(text)?;
        let schedule = schedule.map(|request| request.validate(now)).transpose()?;
        let following = self
            .next_id
            .checked_add(1)
            .ok_or(ValidationError::IdsExhausted)?;

        let task = Task {
            id: self.next_id,
            text: text.to_string(),
            completed: false,
            created_at: now.with_timezone(&Utc),
            schedule,
        };
        self.next_id = following;
        self.tasks.insert(0, task);
        Ok(&self.tasks[0])
    }

    /// Flip `completed`. Unknown ids are ignored; returns whether a task changed.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                true
            }
            None => false,
        }
    }

    /// Remove a task by id. Unknown ids are ignored; returns whether one was removed.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        before - self.tasks.len()
    }

    /// Drop every task and restart ids at 1
    pub fn clear_all(&mut self) {
        self.tasks.clear();
        self.next_id = FIRST_TASK_ID;
    }
}

/// On-disk shape of a task, one entry of the `todoTasks` array.
///
/// Schedule fields are flattened and optional; [`Task`] regroups them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub due_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_alarm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_triggered: Option<bool>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        let schedule = task.schedule.as_ref();
        TaskRecord {
            id: task.id,
            text: task.text.clone(),
            completed: task.completed,
            created_at: task.created_at,
            due_date: schedule.map(|s| s.due_date),
            due_time: schedule.map(|s| s.due_time),
            has_alarm: schedule.map(Schedule::has_alarm),
            alarm_triggered: schedule.filter(|s| s.alarm_triggered()).map(|_| true),
        }
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = Error;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let schedule = match (record.due_date, record.due_time) {
            (Some(due_date), Some(due_time)) => {
                let alarm = match (
                    record.has_alarm.unwrap_or(false),
                    record.alarm_triggered.unwrap_or(false),
                ) {
                    (false, _) => AlarmState::Off,
                    (true, false) => AlarmState::Armed,
                    (true, true) => AlarmState::Fired,
                };
                Some(Schedule {
                    due_date,
                    due_time: truncate_to_minute(due_time),
                    alarm,
                })
            }
            (None, None) => None,
            _ => {
                return Err(Error::CorruptRecord(format!(
                    "task {} has only one of dueDate and dueTime",
                    record.id
                )))
            }
        };

        Ok(Task {
            id: record.id,
            text: record.text,
            completed: record.completed,
            created_at: record.created_at,
            schedule,
        })
    }
}

/// `HH:MM` time-of-day encoding. Reads `HH:MM:SS` too.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid time {raw:?}: {err}")))
    }
}
